//! Test problems with known answers, and a harness that runs them against
//! solver cases and tallies the outcomes.

mod error;
pub mod expectations;
pub mod problems;
pub mod runner;
pub mod scenario;
pub mod solvers;
pub mod summary;

pub use error::SuiteError;
pub use expectations::{CaseKey, Expectations, VersionRange};
pub use problems::{Capability, ExpectedResult, ProblemCase, Suffix, SuffixExclusions, all_problems, problem};
pub use runner::{Outcome, RunOptions, ScenarioResult, run_scenarios};
pub use scenario::{Scenario, ScenarioStatus, generate_scenarios};
pub use solvers::{Io, SolverCase, Version, builtin_solvers, parse_label};
pub use summary::{Summary, Tally};

use lpcase_lang::Model;

/// Look up a problem by name and build its model.
pub fn build_problem(name: &str) -> Result<(&'static ProblemCase, Model), SuiteError> {
    let case = problem(name).ok_or_else(|| SuiteError::UnknownProblem(name.to_string()))?;
    let model = case.build_model().map_err(|source| SuiteError::Build {
        problem: name.to_string(),
        source,
    })?;
    Ok((case, model))
}

/// Look up a built-in solver case by its `solver/io` label.
pub fn solver_case(label: &str) -> Result<SolverCase, SuiteError> {
    let (name, io) = parse_label(label)?;
    builtin_solvers()
        .into_iter()
        .find(|s| s.name == name && s.io == io)
        .ok_or_else(|| SuiteError::UnknownSolverCase(label.to_string()))
}
