//! Build output directory handling for multi-platform runs.

use std::fs;
use std::path::{Path, PathBuf};

use fs_extra::dir::{move_dir, CopyOptions};
use tracing::{debug, info, warn};

use crate::error::{CiError, CiResult};

/// Name of the build output directory under the source root.
pub const BUILD_DIR_NAME: &str = "build";

/// Where containers leave build output and where it is kept per platform.
#[derive(Debug, Clone)]
pub struct BuildLayout {
    source_root: PathBuf,
}

impl BuildLayout {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Shared build output directory, written by every platform run.
    pub fn build_dir(&self) -> PathBuf {
        self.source_root.join(BUILD_DIR_NAME)
    }

    /// Directory a platform's build output is moved to.
    pub fn platform_dir(&self, platform: &str) -> PathBuf {
        self.source_root
            .join(format!("{}_{}", BUILD_DIR_NAME, platform))
    }

    /// Remove the shared build directory, ignoring errors.
    pub fn reset(&self) {
        let dir = self.build_dir();
        if let Err(e) = fs::remove_dir_all(&dir) {
            debug!("Not removing {:?}: {}", dir, e);
        }
    }

    /// Move the shared build directory to the platform's directory.
    ///
    /// A previous platform directory is replaced. Returns `None` when the
    /// run left no build directory behind.
    pub fn relocate(&self, platform: &str) -> CiResult<Option<PathBuf>> {
        let from = self.build_dir();
        let to = self.platform_dir(platform);

        let relocation_error = |message: String| CiError::ArtifactRelocation {
            from: from.clone(),
            to: to.clone(),
            message,
        };

        if !from.is_dir() {
            warn!("No build output in {:?} for platform {}", from, platform);
            return Ok(None);
        }

        if to.exists() {
            debug!("Replacing previous artifacts in {:?}", to);
            fs::remove_dir_all(&to).map_err(|e| relocation_error(e.to_string()))?;
        }

        if fs::rename(&from, &to).is_err() {
            // Different filesystems: copy then delete.
            let options = CopyOptions::new().copy_inside(true);
            move_dir(&from, &to, &options).map_err(|e| relocation_error(e.to_string()))?;
        }

        info!("Built files left in: {}", to.display());
        Ok(Some(to))
    }
}
