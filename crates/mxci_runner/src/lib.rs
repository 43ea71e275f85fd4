//! # mxci_runner
//!
//! Container engine wrapper for mxci.
//!
//! Builds images and runs commands in containers by shelling out to the
//! engine CLI (`docker`, `nvidia-docker` or `podman`).
//!
//! # Features
//!
//! - **CLI Runner**: drives the engine binary with the terminal attached
//! - **Runtime Detection**: Docker first, Podman as fallback
//! - **Command Rendering**: reproducible command lines for logs and debugging
//! - **Mock Runner**: For testing without actual containers
//!
//! # Example
//!
//! ```rust,no_run
//! use mxci_runner::{CliRunner, CliRunnerOptions, ContainerRunner, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = CliRunner::new(CliRunnerOptions::default())?;
//!
//!     let config = RunConfig::new("mxnetci/build.test.rpi")
//!         .shm_size("2g")
//!         .command(vec!["ls".to_string()]);
//!
//!     let result = runner.run_container(&config).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod mock;
pub mod runner;

pub use cli::{CliRunner, CliRunnerOptions, ContainerRuntime};
pub use config::{render_command, BuildConfig, RunConfig, UserMapping};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use runner::{ContainerRunner, ExecutionResult};
