//! CLI-level errors (wraps tree errors)

use thiserror::Error;

use crate::errors::TreeError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("scenario failed: {0} check(s) did not hold")]
    ScenarioFailed(usize),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::ScenarioFailed(_) => crate::exitcode::DATAERR,
            CliError::Tree(TreeError::Config { .. }) => crate::exitcode::CONFIG,
            CliError::Tree(_) => crate::exitcode::SOFTWARE,
        }
    }
}
