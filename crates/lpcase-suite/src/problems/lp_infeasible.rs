use lpcase_lang::{Domain, Model, ModelError, Sense};
use lpcase_solver::SolutionStatus;

use super::{Capability, ExpectedResult, ProblemCase};

pub(super) const PROBLEM: ProblemCase = ProblemCase {
    name: "LP_infeasible",
    description: "A linear model with contradicting rows",
    capabilities: &[Capability::Linear],
    test_suffixes: &[],
    build,
    expected,
};

fn build() -> Result<Model, ModelError> {
    let mut model = Model::new("LP_infeasible");
    let x = model.add_var("x", Domain::NonNegativeReals)?;
    let y = model.add_var("y", Domain::NonNegativeReals)?;

    model.set_objective("obj", x + y, Sense::Minimize)?;
    model.add_constraint("at_most", (x + y).le(1.0))?;
    model.add_constraint("at_least", (x + y).ge(2.0))?;
    Ok(model)
}

fn expected() -> ExpectedResult {
    ExpectedResult::terminated(SolutionStatus::Infeasible)
}
