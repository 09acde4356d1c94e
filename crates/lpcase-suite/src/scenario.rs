use std::fmt;

use crate::expectations::{CaseKey, Expectations};
use crate::problems::{ProblemCase, SuffixExclusions, all_problems};
use crate::solvers::{Io, SolverCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioStatus {
    Ok,
    Skip,
    ExpectedFailure,
}

impl ScenarioStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioStatus::Ok => "ok",
            ScenarioStatus::Skip => "skip",
            ScenarioStatus::ExpectedFailure => "expected failure",
        }
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One problem paired with one solver case
#[derive(Debug, Clone)]
pub struct Scenario {
    pub problem: &'static ProblemCase,
    pub solver: SolverCase,
    pub status: ScenarioStatus,
    pub message: String,
    pub exclude_suffixes: SuffixExclusions,
}

impl Scenario {
    pub fn key(&self) -> (&'static str, &'static str, Io) {
        (self.problem.name, self.solver.name, self.solver.io)
    }
}

/// Pair every problem accepted by `filter` with every solver case able to
/// run it, in `(problem, solver, io)` order.
///
/// A scenario is skipped when its solver is unavailable or a skip entry
/// matches, marked as an expected failure when a failure entry matches, and
/// otherwise runs with the suffixes a matching missing-suffix entry names
/// left out of validation.
pub fn generate_scenarios<F>(solvers: &[SolverCase], expectations: &Expectations, filter: F) -> Vec<Scenario>
where
    F: Fn(&ProblemCase) -> bool,
{
    let mut solvers: Vec<&SolverCase> = solvers.iter().collect();
    solvers.sort_by_key(|s| (s.name, s.io));

    let mut problems: Vec<&'static ProblemCase> = all_problems().iter().filter(|&p| filter(p)).collect();
    problems.sort_by_key(|p| p.name);

    let mut scenarios = Vec::new();
    for problem in problems {
        for &solver in &solvers {
            if !problem.capabilities.iter().all(|&c| solver.supports(c)) {
                continue;
            }

            let key = CaseKey::new(solver.name, solver.io, problem.name);
            let version = solver.version;
            let mut exclude_suffixes = SuffixExclusions::new();
            let (status, message) = if !solver.available {
                (
                    ScenarioStatus::Skip,
                    format!("Skipping test because solver {} ({}) is unavailable", solver.name, solver.io),
                )
            } else if let Some(skip) = expectations.skip_for(&key, version) {
                (ScenarioStatus::Skip, skip.reason.clone())
            } else if let Some(failure) = expectations.failure_for(&key, version) {
                (ScenarioStatus::ExpectedFailure, failure.reason.clone())
            } else if let Some(missing) = expectations.missing_suffix_for(&key, version) {
                exclude_suffixes = missing.suffixes.clone();
                (ScenarioStatus::Ok, missing.reason.clone())
            } else {
                (ScenarioStatus::Ok, String::new())
            };

            scenarios.push(Scenario {
                problem,
                solver: solver.clone(),
                status,
                message,
                exclude_suffixes,
            });
        }
    }
    scenarios
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectations::VersionRange;
    use crate::problems::{Capability, Suffix};
    use crate::solvers::{Version, builtin_solvers};
    use std::collections::BTreeSet;

    #[test]
    fn test_builtin_scenarios_are_all_ok() {
        let scenarios = generate_scenarios(&builtin_solvers(), &Expectations::builtin(), |_| true);
        assert_eq!(scenarios.len(), all_problems().len() * 3);
        assert!(scenarios.iter().all(|s| s.status == ScenarioStatus::Ok && s.message.is_empty()));

        let keys: Vec<_> = scenarios.iter().map(Scenario::key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys[0], ("LP_basic", "simplex", Io::Direct));
        assert_eq!(keys[1], ("LP_basic", "simplex", Io::Lp));
        assert_eq!(keys[2], ("LP_basic", "simplex_bland", Io::Direct));
    }

    #[test]
    fn test_capabilities_filter_solvers() {
        let mut limited = builtin_solvers().remove(0);
        limited.name = "limited";
        limited.capabilities = &[Capability::Linear];

        let scenarios = generate_scenarios(&[limited], &Expectations::new(), |_| true);
        let problems: Vec<_> = scenarios.iter().map(|s| s.problem.name).collect();
        assert!(problems.contains(&"LP_basic"));
        assert!(!problems.contains(&"LP_free_variable"));
        assert!(!problems.contains(&"LP_inactive_constraint"));
    }

    #[test]
    fn test_problem_filter() {
        let scenarios = generate_scenarios(&builtin_solvers(), &Expectations::new(), |p| p.name == "LP_basic");
        assert_eq!(scenarios.len(), 3);
    }

    #[test]
    fn test_status_precedence() {
        let mut solvers = builtin_solvers();
        solvers[2].available = false;

        let mut expectations = Expectations::new();
        let basic_lp = CaseKey::new("simplex", Io::Lp, "LP_basic");
        expectations.skip(basic_lp.clone(), VersionRange::ALL, "skipped");
        expectations.expect_failure(basic_lp, VersionRange::ALL, "failing");
        expectations.expect_failure(
            CaseKey::new("simplex", Io::Direct, "LP_basic"),
            VersionRange {
                min: Some(Version::new(9, 0, 0, 0)),
                ..VersionRange::ALL
            },
            "only in the future",
        );
        let mut suffixes = SuffixExclusions::new();
        suffixes.insert(Suffix::Dual, (true, BTreeSet::new()));
        expectations.missing_suffix(
            CaseKey::new("simplex", Io::Direct, "LP_duals_maximize"),
            VersionRange::ALL,
            suffixes,
            "no duals",
        );
        expectations.expect_failure(
            CaseKey::new("simplex", Io::Direct, "LP_unbounded"),
            VersionRange::ALL,
            "reports optimal",
        );

        let scenarios = generate_scenarios(&solvers, &expectations, |_| true);
        let find = |problem: &str, solver: &str, io: Io| {
            scenarios
                .iter()
                .find(|s| s.key() == (problem, solver, io))
                .unwrap_or_else(|| panic!("{} {} {}", problem, solver, io))
        };

        let s = find("LP_basic", "simplex", Io::Lp);
        assert_eq!((s.status, s.message.as_str()), (ScenarioStatus::Skip, "skipped"));

        let s = find("LP_basic", "simplex", Io::Direct);
        assert_eq!(s.status, ScenarioStatus::Ok);

        let s = find("LP_basic", "simplex_bland", Io::Direct);
        assert_eq!(s.status, ScenarioStatus::Skip);
        assert_eq!(s.message, "Skipping test because solver simplex_bland (direct) is unavailable");

        let s = find("LP_duals_maximize", "simplex", Io::Direct);
        assert_eq!((s.status, s.message.as_str()), (ScenarioStatus::Ok, "no duals"));
        assert!(s.exclude_suffixes.contains_key(&Suffix::Dual));

        let s = find("LP_unbounded", "simplex", Io::Direct);
        assert_eq!(s.status, ScenarioStatus::ExpectedFailure);
    }
}
