mod error;
mod problem;
mod simplex;
mod solution;

pub use error::SolveError;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective};
pub use simplex::{PivotRule, Solver};
pub use solution::{ReducedCost, RowDual, Solution, SolutionStatus};
