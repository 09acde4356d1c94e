use lpcase_lang::{Domain, Model, ModelError, Sense};
use lpcase_solver::SolutionStatus;

use super::{Capability, ExpectedResult, ProblemCase, Suffix};

pub(super) const PROBLEM: ProblemCase = ProblemCase {
    name: "LP_duals_maximize",
    description: "A maximization model with <=, >= and = rows",
    capabilities: &[Capability::Linear],
    test_suffixes: &[Suffix::Dual, Suffix::Rc],
    build,
    expected,
};

fn build() -> Result<Model, ModelError> {
    let mut model = Model::new("LP_duals_maximize");
    let x = model.add_var("x", Domain::NonNegativeReals)?;
    let y = model.add_var("y", Domain::NonNegativeReals)?;
    let z = model.add_var("z", Domain::NonNegativeReals)?;

    model.set_objective("obj", 3.0 * x + 2.0 * y + z, Sense::Maximize)?;
    model.add_constraint("capacity", (x + y + z).le(4.0))?;
    model.add_constraint("spread", (x - y).ge(-2.0))?;
    model.add_constraint("fixed", z.equals(1.0))?;
    Ok(model)
}

// With z pinned at 1, capacity leaves 3 units for x. One more unit of
// capacity is worth 3; one more unit of z displaces an x.
fn expected() -> ExpectedResult {
    ExpectedResult {
        termination: SolutionStatus::Optimal,
        objective: Some(10.0),
        values: vec![("x", 3.0), ("y", 0.0), ("z", 1.0)],
        duals: vec![("capacity", 3.0), ("fixed", -2.0), ("spread", 0.0)],
        reduced_costs: vec![("x", 0.0), ("y", -1.0), ("z", 0.0)],
    }
}
