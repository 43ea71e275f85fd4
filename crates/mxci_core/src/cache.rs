//! Restoring image layers from a registry before a build.

use tracing::{info, warn};

use mxci_runner::ContainerRunner;

/// Environment variable set by the CI job harness.
pub const JOB_NAME_ENV: &str = "JOB_NAME";

/// Whether the registry cache should be used.
///
/// Running under a CI job turns it on implicitly.
pub fn cache_enabled(requested: bool, job_name: Option<&str>) -> bool {
    requested || job_name.is_some()
}

/// Pull the previous image for `tag` so its layers can seed the build.
///
/// Returns whether the pull succeeded. A failed pull only costs build time,
/// so it is logged and otherwise ignored.
pub async fn load_docker_cache<R>(runner: &R, tag: &str, registry: &str) -> bool
where
    R: ContainerRunner + ?Sized,
{
    if registry.is_empty() {
        info!("Distributed docker cache disabled");
        return false;
    }

    info!("Loading docker cache for {} from {}", tag, registry);
    match runner.pull_image(tag).await {
        Ok(()) => {
            info!("Successfully pulled docker cache");
            true
        }
        Err(e) => {
            warn!("Docker cache download failed for {}: {}", tag, e);
            false
        }
    }
}
