//! CLI-based container runner supporting Docker, nvidia-docker and Podman.
//!
//! Every operation shells out to the engine binary. Build and run output
//! goes straight to the terminal; only image lookups capture stdout.

use std::process::{Command, Stdio};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::{render_command, BuildConfig, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ContainerRunner, ExecutionResult};

/// Container runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerRuntime {
    Docker,
    NvidiaDocker,
    Podman,
}

impl ContainerRuntime {
    /// Get the CLI command name.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::NvidiaDocker => "nvidia-docker",
            Self::Podman => "podman",
        }
    }
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// CLI-based container runner options.
#[derive(Debug, Clone, Default)]
pub struct CliRunnerOptions {
    /// Preferred runtime (if not set, auto-detect)
    pub preferred_runtime: Option<ContainerRuntime>,
}

impl CliRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefer(mut self, runtime: ContainerRuntime) -> Self {
        self.preferred_runtime = Some(runtime);
        self
    }

    pub fn prefer_docker(self) -> Self {
        self.prefer(ContainerRuntime::Docker)
    }

    pub fn prefer_nvidia_docker(self) -> Self {
        self.prefer(ContainerRuntime::NvidiaDocker)
    }

    pub fn prefer_podman(self) -> Self {
        self.prefer(ContainerRuntime::Podman)
    }
}

/// CLI-based container runner.
pub struct CliRunner {
    runtime: ContainerRuntime,
}

impl CliRunner {
    /// Create a new CLI runner with runtime detection.
    pub fn new(options: CliRunnerOptions) -> RunnerResult<Self> {
        let runtime = Self::detect_runtime(&options)?;
        info!("Using container runtime: {}", runtime);
        Ok(Self { runtime })
    }

    /// Create a runner with a specific runtime, skipping detection.
    pub fn with_runtime(runtime: ContainerRuntime) -> Self {
        Self { runtime }
    }

    /// Detect available container runtime.
    ///
    /// nvidia-docker is never substituted: GPU tests on plain docker
    /// would pass for the wrong reasons.
    pub fn detect_runtime(options: &CliRunnerOptions) -> RunnerResult<ContainerRuntime> {
        if let Some(preferred) = options.preferred_runtime {
            if Self::is_runtime_available(preferred) {
                return Ok(preferred);
            }
            if preferred == ContainerRuntime::NvidiaDocker {
                return Err(RunnerError::RuntimeNotAvailable(format!(
                    "{} is not installed or not working",
                    preferred
                )));
            }
            warn!(
                "Preferred runtime {} not available, trying alternatives",
                preferred
            );
        }

        if Self::is_runtime_available(ContainerRuntime::Docker) {
            return Ok(ContainerRuntime::Docker);
        }

        if Self::is_runtime_available(ContainerRuntime::Podman) {
            return Ok(ContainerRuntime::Podman);
        }

        Err(RunnerError::RuntimeNotAvailable(
            "Neither Docker nor Podman is available".to_string(),
        ))
    }

    fn is_runtime_available(runtime: ContainerRuntime) -> bool {
        Command::new(runtime.command())
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Format command for logging.
    fn format_command(&self, args: &[String]) -> String {
        render_command(self.runtime.command(), args)
    }

    /// Run the engine with inherited stdio and return its exit code.
    fn execute_attached(&self, args: &[String]) -> RunnerResult<i64> {
        debug!("Executing: {}", self.format_command(args));

        let status = Command::new(self.runtime.command())
            .args(args)
            .status()
            .map_err(|e| {
                RunnerError::ExecutionFailed(format!("Failed to spawn {}: {}", self.runtime, e))
            })?;

        // Killed by a signal: no code
        Ok(status.code().map(i64::from).unwrap_or(-1))
    }

    /// Run a short command and capture stdout.
    fn run_simple_command(&self, args: &[&str]) -> RunnerResult<String> {
        let output = Command::new(self.runtime.command())
            .args(args)
            .output()
            .map_err(|e| RunnerError::ExecutionFailed(e.to_string()))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(RunnerError::ExecutionFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ))
        }
    }
}

#[async_trait]
impl ContainerRunner for CliRunner {
    fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }

    async fn is_available(&self) -> RunnerResult<bool> {
        Ok(Self::is_runtime_available(self.runtime))
    }

    async fn pull_image(&self, tag: &str) -> RunnerResult<()> {
        info!("Pulling image: {}", tag);

        let args = vec!["pull".to_string(), tag.to_string()];
        let exit_code = self.execute_attached(&args)?;

        if exit_code == 0 {
            info!("Successfully pulled: {}", tag);
            Ok(())
        } else {
            Err(RunnerError::ImagePullFailed(format!(
                "{} exited with code {}",
                self.format_command(&args),
                exit_code
            )))
        }
    }

    async fn image_id(&self, tag: &str) -> RunnerResult<Option<String>> {
        let output = self.run_simple_command(&["images", "-q", tag])?;
        Ok(output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string))
    }

    async fn build_image(&self, config: &BuildConfig) -> RunnerResult<String> {
        info!("Building container tagged '{}' with {}", config.tag, self.runtime);

        let args = config.args();
        let command = self.format_command(&args);
        info!("Running command: '{}'", command);

        let exit_code = self.execute_attached(&args)?;
        if exit_code != 0 {
            error!("Build of {} failed with exit code {}", config.tag, exit_code);
            return Err(RunnerError::BuildFailed { exit_code, command });
        }

        // The build succeeded, so the tag exists unless something raced us.
        match self.image_id(&config.tag).await? {
            Some(id) => {
                info!("Successfully built image: {} ({})", config.tag, id);
                Ok(id)
            }
            None => Err(RunnerError::ImageNotFound(config.tag.clone())),
        }
    }

    async fn run_container(&self, config: &RunConfig) -> RunnerResult<ExecutionResult> {
        let args = config.args();

        let started_at = Utc::now();
        let exit_code = self.execute_attached(&args)?;
        let result = ExecutionResult::new(exit_code, started_at, Utc::now());

        if result.success() {
            info!("Container completed successfully in {}ms", result.duration_ms);
        } else {
            error!(
                "Container failed with exit code {} after {}ms",
                result.exit_code, result.duration_ms
            );
        }

        Ok(result)
    }
}
