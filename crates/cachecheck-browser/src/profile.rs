use crate::Result;
use cachecheck_core::Settings;
use std::path::{Path, PathBuf};

/// Chrome user-data directory for the session.
///
/// A persistent profile keeps cookies between runs, so a geocaching.com or
/// project-gc.com login done once in the browser window is still there next
/// time. A temporary profile is removed when dropped.
pub struct ProfileManager {
    path: PathBuf,
    is_temporary: bool,
}

impl ProfileManager {
    pub fn temporary() -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("cachecheck-profile-")
            .tempdir()?
            .keep();

        Ok(Self {
            path,
            is_temporary: true,
        })
    }

    /// Use (and create if needed) the profile directory at `path`
    pub fn persistent(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        }

        Ok(Self {
            path,
            is_temporary: false,
        })
    }

    /// Persistent profile `name` under `~/.cachecheck/profiles`
    pub fn named(name: &str) -> Result<Self> {
        Self::persistent(Self::profiles_dir()?.join(name))
    }

    pub fn profiles_dir() -> Result<PathBuf> {
        Ok(Settings::app_dir()?.join("profiles"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

impl Drop for ProfileManager {
    fn drop(&mut self) {
        if self.is_temporary && self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                tracing::debug!("Failed to remove temporary profile {}: {}", self.path.display(), e);
            }
        }
    }
}
