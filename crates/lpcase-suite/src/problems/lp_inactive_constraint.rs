use lpcase_lang::{Domain, Model, ModelError, Sense};
use lpcase_solver::SolutionStatus;

use super::{Capability, ExpectedResult, ProblemCase, Suffix};

pub(super) const PROBLEM: ProblemCase = ProblemCase {
    name: "LP_inactive_constraint",
    description: "A deactivated row and a bounded variable",
    capabilities: &[Capability::Linear, Capability::VariableBounds],
    test_suffixes: &[Suffix::Dual, Suffix::Rc],
    build,
    expected,
};

fn build() -> Result<Model, ModelError> {
    let mut model = Model::new("LP_inactive_constraint");
    let x = model.add_var_bounded("x", Domain::NonNegativeReals, None, Some(1.5))?;
    let y = model.add_var("y", Domain::NonNegativeReals)?;

    model.set_objective("obj", x + 2.0 * y, Sense::Minimize)?;
    model.add_constraint("demand", (x + y).ge(2.0))?;
    // Would force x up to 5 and make the model infeasible
    model.add_constraint("floor", x.ge(5.0))?;
    model.deactivate("floor")?;
    Ok(model)
}

// x sits at its upper bound, so its reduced cost is the bound's dual
fn expected() -> ExpectedResult {
    ExpectedResult {
        termination: SolutionStatus::Optimal,
        objective: Some(2.5),
        values: vec![("x", 1.5), ("y", 0.5)],
        duals: vec![("demand", 2.0)],
        reduced_costs: vec![("x", -1.0), ("y", 0.0)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpcase_lang::{compile, solve};
    use lpcase_solver::Solver;

    #[test]
    fn test_inactive_row_is_not_reported() {
        let model = build().unwrap();
        assert!(!model.constraint("floor").unwrap().active);

        let compiled = compile(&model).unwrap();
        assert_eq!(compiled.lp_problem.num_constraints(), 2);

        let solution = solve(&model, &Solver::new()).unwrap();
        assert!(solution.dual("floor").is_none());
    }
}
