//! Platform discovery from a directory of Dockerfiles.
//!
//! A platform exists when `<dir>/Dockerfile.build.test.<platform>` does.
//! Editor backups (trailing `~`) are ignored.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CiError, CiResult};

/// Filename prefix shared by every platform Dockerfile.
pub const DOCKERFILE_PREFIX: &str = "Dockerfile.build.test.";

/// Default Dockerfile directory, relative to the working directory.
pub const DEFAULT_DOCKER_DIR: &str = "docker";

/// Image tag for a platform: `<registry>/build.test.<platform>`.
pub fn docker_tag(platform: &str, registry: &str) -> String {
    format!("{}/build.test.{}", registry, platform)
}

/// Catalog of the platforms defined in a Dockerfile directory.
#[derive(Debug, Clone)]
pub struct PlatformCatalog {
    dir: PathBuf,
}

impl Default for PlatformCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_DIR)
    }
}

impl PlatformCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the Dockerfiles. Also the image build context.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted platform identifiers.
    ///
    /// A missing or unreadable directory yields an empty list.
    pub fn platforms(&self) -> Vec<String> {
        let pattern = format!(
            "{}/{}*",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            DOCKERFILE_PREFIX
        );

        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Invalid platform pattern {}: {}", pattern, e);
                return Vec::new();
            }
        };

        let mut platforms: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .and_then(|name| name.strip_prefix(DOCKERFILE_PREFIX))
                    .filter(|platform| !platform.is_empty() && !platform.ends_with('~'))
                    .map(str::to_string)
            })
            .collect();

        if platforms.is_empty() {
            debug!("No platform Dockerfiles found in {:?}", self.dir);
        }

        platforms.sort();
        platforms
    }

    /// Path of the Dockerfile for a platform.
    pub fn dockerfile(&self, platform: &str) -> PathBuf {
        self.dir.join(format!("{}{}", DOCKERFILE_PREFIX, platform))
    }

    /// Check if a platform's Dockerfile exists.
    pub fn contains(&self, platform: &str) -> bool {
        self.dockerfile(platform).is_file()
    }

    /// Validate a platform name against the catalog.
    pub fn require(&self, platform: &str) -> CiResult<()> {
        if self.contains(platform) {
            Ok(())
        } else {
            Err(CiError::UnknownPlatform {
                platform: platform.to_string(),
                known: self.platforms().join(", "),
            })
        }
    }
}
