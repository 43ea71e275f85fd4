//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur during runner operations.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Container engine not available: {0}")]
    RuntimeNotAvailable(String),

    #[error("Container execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Unable to find docker image id matching with {0}")]
    ImageNotFound(String),

    #[error("Image pull failed: {0}")]
    ImagePullFailed(String),

    #[error("Container build failed ({exit_code}): {command}")]
    BuildFailed { exit_code: i64, command: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Exit code of the external process behind this error, if one ran.
    pub fn exit_code(&self) -> Option<i64> {
        match self {
            Self::BuildFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
