//! Registry of test problems.
//!
//! Each problem builds a fresh [`Model`] and carries the results a correct
//! solver must reproduce: termination condition, primal values, objective and
//! optionally the `dual` and `rc` suffixes.

use std::collections::{BTreeMap, BTreeSet};

use lpcase_lang::{Model, ModelError, ModelSolution};
use lpcase_solver::SolutionStatus;
use serde::Deserialize;

mod lp_basic;
mod lp_duals_maximize;
mod lp_free_variable;
mod lp_inactive_constraint;
mod lp_infeasible;
mod lp_unbounded;

/// Model feature a solver case must support to run a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Linear,
    FreeVariables,
    VariableBounds,
}

/// Solution data beyond primal values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suffix {
    Dual,
    Rc,
}

impl Suffix {
    pub fn name(self) -> &'static str {
        match self {
            Suffix::Dual => "dual",
            Suffix::Rc => "rc",
        }
    }
}

/// Suffixes a solver is known not to report: per suffix, whether finding it
/// anyway is an error, and which components it covers (empty means all).
pub type SuffixExclusions = BTreeMap<Suffix, (bool, BTreeSet<String>)>;

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedResult {
    pub termination: SolutionStatus,
    pub objective: Option<f64>,
    pub values: Vec<(&'static str, f64)>,
    pub duals: Vec<(&'static str, f64)>,
    pub reduced_costs: Vec<(&'static str, f64)>,
}

impl ExpectedResult {
    fn terminated(termination: SolutionStatus) -> Self {
        Self {
            termination,
            objective: None,
            values: Vec::new(),
            duals: Vec::new(),
            reduced_costs: Vec::new(),
        }
    }
}

pub struct ProblemCase {
    pub name: &'static str,
    pub description: &'static str,
    pub capabilities: &'static [Capability],
    /// Suffixes checked when validating a solution
    pub test_suffixes: &'static [Suffix],
    pub build: fn() -> Result<Model, ModelError>,
    pub expected: fn() -> ExpectedResult,
}

impl std::fmt::Debug for ProblemCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProblemCase").field("name", &self.name).finish()
    }
}

/// Outcome of comparing a loaded solution with the expected one
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Validation {
    pub mismatches: Vec<String>,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

fn close(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= tolerance * (1.0 + expected.abs())
}

impl ProblemCase {
    pub fn build_model(&self) -> Result<Model, ModelError> {
        (self.build)()
    }

    pub fn expected_result(&self) -> ExpectedResult {
        (self.expected)()
    }

    pub fn requires(&self) -> BTreeSet<Capability> {
        self.capabilities.iter().copied().collect()
    }

    /// Check the termination condition only.
    pub fn validate_termination(&self, status: SolutionStatus) -> Result<(), String> {
        let expected = self.expected_result().termination;
        if status == expected {
            Ok(())
        } else {
            Err(format!("expected termination {}, got {}", expected, status))
        }
    }

    /// Compare the values loaded on `model` and the suffixes in `solution`
    /// against the expected result.
    pub fn validate_solution(
        &self,
        model: &Model,
        solution: &ModelSolution,
        exclude: &SuffixExclusions,
        tolerance: f64,
    ) -> Validation {
        let expected = self.expected_result();
        let mut validation = Validation::default();

        for &(name, want) in &expected.values {
            let got = model.var(name).and_then(|id| model.value(id));
            match got {
                Some(v) if close(v, want, tolerance) => {}
                Some(v) => validation.mismatches.push(format!("{}: value {} != {}", name, v, want)),
                None => validation.mismatches.push(format!("{}: no value loaded", name)),
            }
        }

        if let Some(want) = expected.objective {
            let got = model.objective().and_then(|o| model.evaluate(&o.expr));
            match got {
                Some(v) if close(v, want, tolerance) => {}
                Some(v) => validation.mismatches.push(format!("objective {} != {}", v, want)),
                None => validation.mismatches.push("objective could not be evaluated".to_string()),
            }
        }

        for &suffix in self.test_suffixes {
            let (table, got): (&[(&str, f64)], &BTreeMap<String, f64>) = match suffix {
                Suffix::Dual => (&expected.duals, &solution.duals),
                Suffix::Rc => (&expected.reduced_costs, &solution.reduced_costs),
            };
            let exclusion = exclude.get(&suffix);
            for &(name, want) in table {
                if let Some((enforce, names)) = exclusion {
                    if names.is_empty() || names.contains(name) {
                        // A solver known to drop this suffix must keep dropping it
                        if *enforce && got.contains_key(name) {
                            validation
                                .mismatches
                                .push(format!("{}[{}]: excluded suffix was reported", suffix.name(), name));
                        }
                        continue;
                    }
                }
                match got.get(name) {
                    Some(&v) if close(v, want, tolerance) => {}
                    Some(&v) => validation
                        .mismatches
                        .push(format!("{}[{}]: {} != {}", suffix.name(), name, v, want)),
                    None => validation
                        .mismatches
                        .push(format!("{}[{}]: missing", suffix.name(), name)),
                }
            }
        }

        validation
    }
}

static PROBLEMS: &[ProblemCase] = &[
    lp_basic::PROBLEM,
    lp_duals_maximize::PROBLEM,
    lp_free_variable::PROBLEM,
    lp_inactive_constraint::PROBLEM,
    lp_infeasible::PROBLEM,
    lp_unbounded::PROBLEM,
];

/// All registered problems, sorted by name
pub fn all_problems() -> &'static [ProblemCase] {
    PROBLEMS
}

pub fn problem(name: &str) -> Option<&'static ProblemCase> {
    PROBLEMS.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpcase_lang::solve;
    use lpcase_solver::Solver;

    #[test]
    fn test_registry_is_sorted_and_unique() {
        let names: Vec<_> = all_problems().iter().map(|p| p.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_every_problem_builds() {
        for p in all_problems() {
            let model = p.build_model().unwrap_or_else(|e| panic!("{}: {}", p.name, e));
            assert_eq!(model.name, p.name);
        }
    }

    #[test]
    fn test_every_problem_solves_as_expected() {
        let solver = Solver::new();
        for p in all_problems() {
            let mut model = p.build_model().unwrap();
            let solution = solve(&model, &solver).unwrap();
            p.validate_termination(solution.status)
                .unwrap_or_else(|e| panic!("{}: {}", p.name, e));
            if solution.status == SolutionStatus::Optimal {
                solution.load_into(&mut model).unwrap();
                let validation = p.validate_solution(&model, &solution, &SuffixExclusions::new(), 1e-6);
                assert!(validation.is_ok(), "{}: {:?}", p.name, validation.mismatches);
            }
        }
    }

    #[test]
    fn test_excluded_suffix_is_skipped_or_enforced() {
        let p = problem("LP_basic").unwrap();
        let mut model = p.build_model().unwrap();
        let mut solution = solve(&model, &Solver::new()).unwrap();
        solution.load_into(&mut model).unwrap();
        solution.duals.insert("c2".to_string(), 99.0);

        let mut exclude = SuffixExclusions::new();
        exclude.insert(Suffix::Dual, (false, BTreeSet::from(["c2".to_string()])));
        assert!(p.validate_solution(&model, &solution, &exclude, 1e-6).is_ok());

        exclude.insert(Suffix::Dual, (true, BTreeSet::new()));
        let validation = p.validate_solution(&model, &solution, &exclude, 1e-6);
        assert_eq!(validation.mismatches.len(), 2);
    }

    #[test]
    fn test_wrong_value_is_reported() {
        let p = problem("LP_basic").unwrap();
        let mut model = p.build_model().unwrap();
        let solution = solve(&model, &Solver::new()).unwrap();
        solution.load_into(&mut model).unwrap();
        let z = model.var("z").unwrap();
        model.set_value(z, Some(10.0 / 3.0)).unwrap();
        let validation = p.validate_solution(&model, &solution, &SuffixExclusions::new(), 1e-6);
        assert_eq!(validation.mismatches.len(), 2, "{:?}", validation.mismatches);
    }
}
