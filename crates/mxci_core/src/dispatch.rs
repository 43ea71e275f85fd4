//! Build-and-test flows for one platform or for every platform.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mxci_runner::{BuildConfig, ContainerRunner, UserMapping};

use crate::artifacts::BuildLayout;
use crate::cache::load_docker_cache;
use crate::catalog::{docker_tag, PlatformCatalog};
use crate::error::CiResult;
use crate::invocation::{default_test_command, Invocation, RunMode, DEFAULT_SHM_SIZE};
use crate::session::container_run;

/// Registry images are tagged under by default.
pub const DEFAULT_REGISTRY: &str = "mxnetci";

/// Settings shared by every platform in one invocation of the tool.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub registry: String,
    pub shm_size: String,
    pub build_only: bool,
    pub use_cache: bool,
    pub user: Option<UserMapping>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            shm_size: DEFAULT_SHM_SIZE.to_string(),
            build_only: false,
            use_cache: false,
            user: UserMapping::current(),
        }
    }
}

/// What to do in a platform container once its image is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformRequest {
    /// Run a user-supplied command.
    Command(Vec<String>),
    /// Print the interactive run command without running anything.
    PrintDockerRun,
    /// Open a shell in the container.
    IntoContainer,
    /// Run the platform's default test.
    DefaultTest,
}

impl PlatformRequest {
    /// Pick the request from CLI inputs. A command wins over the flags.
    pub fn from_flags(command: Vec<String>, print_docker_run: bool, into_container: bool) -> Self {
        if !command.is_empty() {
            Self::Command(command)
        } else if print_docker_run {
            Self::PrintDockerRun
        } else if into_container {
            Self::IntoContainer
        } else {
            Self::DefaultTest
        }
    }
}

/// Result of a single-platform run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformOutcome {
    /// The image was built and nothing was run.
    BuiltOnly,
    /// The requested command (or shell) finished successfully.
    Completed,
    /// The interactive run command, for the caller to print.
    Printed(String),
}

/// Summary of one platform in an all-platforms run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformReport {
    pub platform: String,
    pub image_id: String,
    /// Where the build output was moved, if the run produced any
    pub artifacts: Option<PathBuf>,
}

/// Drives cache restore, image build and container runs.
pub struct Dispatcher<'a, R: ?Sized> {
    runner: &'a R,
    catalog: PlatformCatalog,
    layout: BuildLayout,
    settings: DispatchSettings,
}

impl<'a, R> Dispatcher<'a, R>
where
    R: ContainerRunner + ?Sized,
{
    pub fn new(
        runner: &'a R,
        catalog: PlatformCatalog,
        layout: BuildLayout,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            runner,
            catalog,
            layout,
            settings,
        }
    }

    pub fn catalog(&self) -> &PlatformCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn tag(&self, platform: &str) -> String {
        docker_tag(platform, &self.settings.registry)
    }

    fn invocation(&self, platform: &str, command: Vec<String>, mode: RunMode) -> Invocation {
        Invocation::new(platform, self.tag(platform))
            .shm_size(self.settings.shm_size.clone())
            .user(self.settings.user)
            .command(command)
            .mode(mode)
    }

    /// Restore the cache if enabled, then build the platform image.
    ///
    /// Returns the id of the built image.
    pub async fn prepare(&self, platform: &str) -> CiResult<String> {
        let tag = self.tag(platform);

        if self.settings.use_cache {
            load_docker_cache(self.runner, &tag, &self.settings.registry).await;
        }

        let mut build = BuildConfig::new(self.catalog.dockerfile(platform), self.catalog.dir(), &tag);
        if let Some(user) = self.settings.user {
            build = build.build_arg("USER_ID", user.uid.to_string());
        }
        build = build.cache_from(&tag);

        Ok(self.runner.build_image(&build).await?)
    }

    /// Build one platform's image and act on it.
    pub async fn run_platform(
        &self,
        platform: &str,
        request: PlatformRequest,
    ) -> CiResult<PlatformOutcome> {
        self.catalog.require(platform)?;
        self.prepare(platform).await?;

        if self.settings.build_only {
            warn!("Container was just built. Exiting due to build-only.");
            return Ok(PlatformOutcome::BuiltOnly);
        }

        let invocation = match request {
            PlatformRequest::Command(command) => {
                self.invocation(platform, command, RunMode::Execute)
            }
            PlatformRequest::PrintDockerRun => {
                let inv = self.invocation(platform, Vec::new(), RunMode::DryRun);
                let cmd = container_run(self.runner, &inv).await?;
                return Ok(PlatformOutcome::Printed(cmd));
            }
            PlatformRequest::IntoContainer => {
                self.invocation(platform, Vec::new(), RunMode::IntoContainer)
            }
            PlatformRequest::DefaultTest => {
                let command = default_test_command(platform);
                info!("No command specified, trying default test: {}", command.join(" "));
                self.invocation(platform, command, RunMode::Execute)
            }
        };

        container_run(self.runner, &invocation).await?;
        Ok(PlatformOutcome::Completed)
    }

    /// Build and test every platform in catalog order.
    ///
    /// Stops at the first failure.
    pub async fn run_all(&self) -> CiResult<Vec<PlatformReport>> {
        let platforms = self.catalog.platforms();
        info!("Building for all architectures: {:?}", platforms);
        info!(
            "Artifacts will be produced in the {} directory.",
            self.layout.build_dir().display()
        );

        let mut reports = Vec::with_capacity(platforms.len());
        for platform in platforms {
            let image_id = self.prepare(&platform).await?;

            if self.settings.build_only {
                reports.push(PlatformReport {
                    platform,
                    image_id,
                    artifacts: None,
                });
                continue;
            }

            self.layout.reset();
            let invocation =
                self.invocation(&platform, default_test_command(&platform), RunMode::Execute);
            container_run(self.runner, &invocation).await?;

            let artifacts = self.layout.relocate(&platform)?;
            reports.push(PlatformReport {
                platform,
                image_id,
                artifacts,
            });
        }

        Ok(reports)
    }
}
