use lpcase_lang::{Domain, Model, ModelError, Sense};
use lpcase_solver::SolutionStatus;

use super::{Capability, ExpectedResult, ProblemCase};

pub(super) const PROBLEM: ProblemCase = ProblemCase {
    name: "LP_unbounded",
    description: "An unbounded linear model",
    capabilities: &[Capability::Linear],
    test_suffixes: &[],
    build,
    expected,
};

fn build() -> Result<Model, ModelError> {
    let mut model = Model::new("LP_unbounded");
    let x = model.add_var("x", Domain::NonNegativeReals)?;
    let y = model.add_var("y", Domain::NonNegativeReals)?;

    model.set_objective("obj", -1.0 * x - y, Sense::Minimize)?;
    model.add_constraint("c1", (x - y).le(1.0))?;
    Ok(model)
}

fn expected() -> ExpectedResult {
    ExpectedResult::terminated(SolutionStatus::Unbounded)
}
