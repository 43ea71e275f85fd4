//! Error types for the core module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for core operations.
pub type CiResult<T> = Result<T, CiError>;

/// Errors that can occur while building and testing platforms.
#[derive(Error, Debug)]
pub enum CiError {
    #[error("Unknown platform '{platform}'. Supported platforms: {known}")]
    UnknownPlatform { platform: String, known: String },

    #[error("Running of command in container failed ({exit_code}): {command}")]
    CommandFailed {
        exit_code: i64,
        command: String,
        /// Interactive variant of the failing command, for manual debugging
        debug_command: String,
    },

    #[error("Failed to move build artifacts from {from:?} to {to:?}: {message}")]
    ArtifactRelocation {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },

    #[error("Runner error: {0}")]
    Runner(#[from] mxci_runner::RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CiError {
    /// Exit code of the external process that caused this error, if any.
    pub fn exit_code(&self) -> Option<i64> {
        match self {
            Self::CommandFailed { exit_code, .. } => Some(*exit_code),
            Self::Runner(e) => e.exit_code(),
            _ => None,
        }
    }
}
