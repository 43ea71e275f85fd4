//! # mxci_core
//!
//! Platform discovery and build/test dispatch for mxci.
//!
//! # Architecture
//!
//! - **Catalog**: platforms derived from `docker/Dockerfile.build.test.<platform>`
//! - **Invocation**: one container run (tag, shm size, user, command, mode)
//! - **Session**: runs an invocation, or renders it for manual use
//! - **Cache**: registry pull before a build
//! - **Artifacts**: per-platform relocation of the build output directory
//! - **Dispatcher**: the single-platform and all-platforms flows
//!
//! # Example
//!
//! ```rust,ignore
//! use mxci_core::{BuildLayout, DispatchSettings, Dispatcher, PlatformCatalog, PlatformRequest};
//! use mxci_runner::{CliRunner, CliRunnerOptions};
//!
//! let runner = CliRunner::new(CliRunnerOptions::default())?;
//! let dispatcher = Dispatcher::new(
//!     &runner,
//!     PlatformCatalog::default(),
//!     BuildLayout::new(".."),
//!     DispatchSettings::default(),
//! );
//!
//! dispatcher.run_platform("rpi", PlatformRequest::DefaultTest).await?;
//! ```

pub mod artifacts;
pub mod cache;
pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod invocation;
pub mod session;

pub use artifacts::BuildLayout;
pub use cache::{cache_enabled, load_docker_cache, JOB_NAME_ENV};
pub use catalog::{docker_tag, PlatformCatalog, DEFAULT_DOCKER_DIR, DOCKERFILE_PREFIX};
pub use dispatch::{
    DispatchSettings, Dispatcher, PlatformOutcome, PlatformReport, PlatformRequest,
    DEFAULT_REGISTRY,
};
pub use error::{CiError, CiResult};
pub use invocation::{default_test_command, Invocation, RunMode, DEFAULT_SHM_SIZE};
pub use session::container_run;
