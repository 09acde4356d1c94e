use lpcase_lang::{Domain, Model, ModelError, Sense};
use lpcase_solver::SolutionStatus;

use super::{Capability, ExpectedResult, ProblemCase, Suffix};

pub(super) const PROBLEM: ProblemCase = ProblemCase {
    name: "LP_basic",
    description: "A continuous linear model",
    capabilities: &[Capability::Linear],
    test_suffixes: &[Suffix::Dual, Suffix::Rc],
    build,
    expected,
};

fn build() -> Result<Model, ModelError> {
    let mut model = Model::new("LP_basic");
    let x = model.add_var("x", Domain::NonNegativeReals)?;
    let y = model.add_var("y", Domain::NonNegativeReals)?;
    let z = model.add_var("z", Domain::NonNegativeReals)?;

    model.set_objective("Z", -2.0 * x - 3.0 * y - 4.0 * z, Sense::Minimize)?;
    model.add_constraint("c1", (3.0 * x + 2.0 * y + 1.0 * z).le(10.0))?;
    model.add_constraint("c2", (2.0 * x + 5.0 * y + 3.0 * z).le(15.0))?;
    Ok(model)
}

fn expected() -> ExpectedResult {
    ExpectedResult {
        termination: SolutionStatus::Optimal,
        objective: Some(-20.0),
        values: vec![("x", 0.0), ("y", 0.0), ("z", 5.0)],
        duals: vec![("c1", 0.0), ("c2", -4.0 / 3.0)],
        reduced_costs: vec![("x", 2.0 / 3.0), ("y", 11.0 / 3.0), ("z", 0.0)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpcase_lang::Relation;

    #[test]
    fn test_model_data() {
        let model = build().unwrap();
        let names: Vec<_> = model.vars().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert!(model.vars().iter().all(|v| v.domain == Domain::NonNegativeReals));

        let objective = model.objective().unwrap();
        assert_eq!(objective.sense, Sense::Minimize);
        let coefficient = |expr: &lpcase_lang::LinearExpr, name: &str| expr.coefficient(model.var(name).unwrap());
        assert_eq!(
            ["x", "y", "z"].map(|n| coefficient(&objective.expr, n)),
            [-2.0, -3.0, -4.0]
        );

        let c1 = model.constraint("c1").unwrap();
        assert_eq!(["x", "y", "z"].map(|n| coefficient(&c1.body, n)), [3.0, 2.0, 1.0]);
        assert_eq!((c1.relation, c1.rhs), (Relation::Le, 10.0));

        let c2 = model.constraint("c2").unwrap();
        assert_eq!(["x", "y", "z"].map(|n| coefficient(&c2.body, n)), [2.0, 5.0, 3.0]);
        assert_eq!((c2.relation, c2.rhs), (Relation::Le, 15.0));
        assert_eq!(model.constraints().len(), 2);
    }

    #[test]
    fn test_expected_point_is_feasible() {
        let mut model = build().unwrap();
        for (name, value) in expected().values {
            let id = model.var(name).unwrap();
            model.set_value(id, Some(value)).unwrap();
        }
        for c in model.constraints() {
            assert!(model.evaluate(&c.body).unwrap() <= c.rhs + 1e-12);
        }
        let objective = model.evaluate(&model.objective().unwrap().expr).unwrap();
        assert_eq!(objective, -20.0);
    }
}
