use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Row {row} has {found} coefficients, expected {expected}")]
    DimensionMismatch {
        row: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in row {row}, column {column}")]
    NonFinite { row: String, column: String },
    #[error("Tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
}
