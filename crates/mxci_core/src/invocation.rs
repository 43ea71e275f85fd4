//! Per-call description of a container run.

use serde::{Deserialize, Serialize};

use mxci_runner::{RunConfig, UserMapping};

/// Default size of /dev/shm inside test containers.
pub const DEFAULT_SHM_SIZE: &str = "2g";

/// Shell used when getting into a container.
pub const INTERACTIVE_SHELL: &str = "/bin/bash";

/// Script inside the test images that dispatches `test_<platform>` functions.
pub const RUNTIME_TEST_SCRIPT: &str = "/work/runtime_test_functions.sh";

/// Default test command for a platform.
pub fn default_test_command(platform: &str) -> Vec<String> {
    vec![RUNTIME_TEST_SCRIPT.to_string(), format!("test_{}", platform)]
}

/// How an invocation is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Run the command and fail on a non-zero exit.
    Execute,
    /// Only construct the interactive command line.
    DryRun,
    /// Open a shell in the container.
    IntoContainer,
}

/// Everything needed to run one command in one platform container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub platform: String,
    pub tag: String,
    pub shm_size: String,
    pub command: Vec<String>,
    pub user: Option<UserMapping>,
    pub mode: RunMode,
}

impl Invocation {
    pub fn new(platform: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            tag: tag.into(),
            shm_size: DEFAULT_SHM_SIZE.to_string(),
            command: Vec::new(),
            user: None,
            mode: RunMode::Execute,
        }
    }

    pub fn shm_size(mut self, size: impl Into<String>) -> Self {
        self.shm_size = size.into();
        self
    }

    pub fn command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    pub fn user(mut self, user: Option<UserMapping>) -> Self {
        self.user = user;
        self
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run configuration for the command itself.
    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(self.tag.clone())
            .shm_size(self.shm_size.clone())
            .user(self.user)
            .command(self.command.clone())
    }

    /// Same run, with an interactive shell as entrypoint.
    pub fn debug_config(&self) -> RunConfig {
        self.run_config().interactive(INTERACTIVE_SHELL)
    }
}
