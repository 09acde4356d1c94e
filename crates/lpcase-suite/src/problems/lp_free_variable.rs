use lpcase_lang::{Domain, Model, ModelError, Sense};
use lpcase_solver::SolutionStatus;

use super::{Capability, ExpectedResult, ProblemCase, Suffix};

pub(super) const PROBLEM: ProblemCase = ProblemCase {
    name: "LP_free_variable",
    description: "A model with a free and a non-positive variable",
    capabilities: &[Capability::Linear, Capability::FreeVariables],
    test_suffixes: &[Suffix::Dual, Suffix::Rc],
    build,
    expected,
};

fn build() -> Result<Model, ModelError> {
    let mut model = Model::new("LP_free_variable");
    let x = model.add_var("x", Domain::Reals)?;
    let y = model.add_var("y", Domain::NonNegativeReals)?;
    let w = model.add_var("w", Domain::NonPositiveReals)?;

    model.set_objective("obj", x + 2.0 * y + w, Sense::Minimize)?;
    model.add_constraint("c1", (x + y).ge(-3.0))?;
    model.add_constraint("c2", (w - y).ge(-2.0))?;
    Ok(model)
}

fn expected() -> ExpectedResult {
    ExpectedResult {
        termination: SolutionStatus::Optimal,
        objective: Some(-5.0),
        values: vec![("x", -3.0), ("y", 0.0), ("w", -2.0)],
        duals: vec![("c1", 1.0), ("c2", 1.0)],
        reduced_costs: vec![("w", 0.0), ("x", 0.0), ("y", 2.0)],
    }
}
