//! Container runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cli::ContainerRuntime;
use crate::config::{BuildConfig, RunConfig};
use crate::error::RunnerResult;

/// Result of container execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code from the container
    pub exit_code: i64,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn new(exit_code: i64, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            exit_code,
            started_at,
            finished_at,
            duration_ms,
        }
    }

    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Container runner trait.
#[async_trait]
pub trait ContainerRunner: Send + Sync {
    /// Engine this runner drives. Used to render reproducible command lines.
    fn runtime(&self) -> ContainerRuntime;

    /// Check if the container engine is available.
    async fn is_available(&self) -> RunnerResult<bool>;

    /// Pull an image by its full tag.
    async fn pull_image(&self, tag: &str) -> RunnerResult<()>;

    /// Look up the local image id for a tag.
    async fn image_id(&self, tag: &str) -> RunnerResult<Option<String>>;

    /// Build an image and return the id of the top level image.
    async fn build_image(&self, config: &BuildConfig) -> RunnerResult<String>;

    /// Run a container to completion with the terminal attached.
    ///
    /// A non-zero exit is reported through [`ExecutionResult::exit_code`],
    /// not as an error.
    async fn run_container(&self, config: &RunConfig) -> RunnerResult<ExecutionResult>;
}
