use lpcase_solver::{SolutionStatus, Solver};
use tracing::{info, warn};

use crate::scenario::{Scenario, ScenarioStatus};
use crate::solvers::Io;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Only run these solvers; empty runs all
    pub solvers: Vec<String>,
    /// Options shared by every solver case
    pub solver: Solver,
    /// Relative tolerance when comparing with expected results
    pub tolerance: f64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            solvers: Vec::new(),
            solver: Solver::new(),
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    ExpectedFailure,
    UnexpectedFailure,
    UnexpectedSuccess,
}

impl Outcome {
    /// Whether the result agrees with the expectations
    pub fn is_ok(self) -> bool {
        matches!(self, Outcome::Pass | Outcome::ExpectedFailure)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    pub problem: String,
    pub solver: String,
    pub io: Io,
    pub outcome: Outcome,
    /// What went wrong, when validation failed
    pub detail: String,
}

fn classify(expect_failure: bool, valid: bool) -> Outcome {
    match (expect_failure, valid) {
        (false, true) => Outcome::Pass,
        (false, false) => Outcome::UnexpectedFailure,
        (true, true) => Outcome::UnexpectedSuccess,
        (true, false) => Outcome::ExpectedFailure,
    }
}

/// Solve and validate every scenario that is not skipped.
pub fn run_scenarios(scenarios: &[Scenario], options: &RunOptions) -> Vec<ScenarioResult> {
    let mut results = Vec::new();

    for scenario in scenarios {
        let case = &scenario.solver;
        if !options.solvers.is_empty() && !options.solvers.iter().any(|s| s == case.name) {
            continue;
        }
        if scenario.status == ScenarioStatus::Skip {
            continue;
        }

        let expect_failure = scenario.status == ScenarioStatus::ExpectedFailure;
        let (outcome, detail) = run_one(scenario, options, expect_failure);
        info!(
            problem = scenario.problem.name,
            solver = case.name,
            io = %case.io,
            ?outcome,
            "scenario finished"
        );
        results.push(ScenarioResult {
            problem: scenario.problem.name.to_string(),
            solver: case.name.to_string(),
            io: case.io,
            outcome,
            detail,
        });
    }

    results
}

fn run_one(scenario: &Scenario, options: &RunOptions, expect_failure: bool) -> (Outcome, String) {
    let problem = scenario.problem;
    let failed = |detail: String| {
        let outcome = if expect_failure {
            Outcome::ExpectedFailure
        } else {
            Outcome::UnexpectedFailure
        };
        (outcome, detail)
    };

    let mut model = match problem.build_model() {
        Ok(model) => model,
        Err(e) => return failed(format!("failed to build model: {}", e)),
    };
    let solution = match scenario.solver.solve(&model, &options.solver) {
        Ok(solution) => solution,
        Err(e) => {
            warn!(problem = problem.name, solver = %scenario.solver.label(), error = %e, "solve failed");
            return failed(e.to_string());
        }
    };

    if let Err(detail) = problem.validate_termination(solution.status) {
        return failed(format!("Unexpected termination condition: {} ({})", solution.status, detail));
    }
    // The expected termination was reached and there is no solution to check
    if matches!(solution.status, SolutionStatus::Unbounded | SolutionStatus::Infeasible) {
        return (Outcome::Pass, String::new());
    }

    if let Err(e) = solution.load_into(&mut model) {
        return failed(format!("failed to load solution: {}", e));
    }
    let validation = problem.validate_solution(&model, &solution, &scenario.exclude_suffixes, options.tolerance);
    let outcome = classify(expect_failure, validation.is_ok());
    (outcome, validation.mismatches.join("; "))
}
