use lpcase_lang::{CompileError, ModelError, ParseError, WriteError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Unknown problem: {0}")]
    UnknownProblem(String),
    #[error("Unknown solver case: {0}")]
    UnknownSolverCase(String),
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),
    #[error("Failed to build problem {problem}: {source}")]
    Build { problem: String, source: ModelError },
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("LP round trip failed: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid expectations file {path}: {message}")]
    Expectations { path: String, message: String },
}
