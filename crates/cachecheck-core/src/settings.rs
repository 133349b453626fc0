use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Waiting times (seconds) offered for the challenge checker settle delay
pub const WAITING_TIME_PRESETS: [f64; 11] =
    [2.0, 5.0, 10.0, 15.0, 20.0, 30.0, 40.0, 45.0, 60.0, 65.0, 70.0];

pub const DEFAULT_WAITING_TIME: f64 = 5.0;

const SETTINGS_FILE: &str = "settings.json";

/// User settings persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Seconds the checker page gets to evaluate before its status is read
    #[serde(default = "default_waiting_time")]
    pub checker_waiting_time: f64,
}

fn default_waiting_time() -> f64 {
    DEFAULT_WAITING_TIME
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            checker_waiting_time: DEFAULT_WAITING_TIME,
        }
    }
}

impl Settings {
    /// Base directory for cachecheck state (`~/.cachecheck`)
    pub fn app_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".cachecheck"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join(SETTINGS_FILE))
    }

    /// Load settings from the default location
    pub fn load() -> Self {
        match Self::default_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                tracing::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from a file, falling back to defaults when the file is
    /// missing or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::read(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!("Settings written to {}", path.display());
        Ok(())
    }

    /// Set the checker waiting time; only preset values are accepted
    pub fn set_waiting_time(&mut self, seconds: f64) -> Result<()> {
        if !is_preset(seconds) {
            return Err(Error::InvalidWaitingTime(seconds, presets_list()));
        }
        self.checker_waiting_time = seconds;
        Ok(())
    }

    /// Settle delay as a `Duration`; negative or non-finite values become zero
    pub fn waiting_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.checker_waiting_time).unwrap_or_default()
    }
}

pub fn is_preset(seconds: f64) -> bool {
    WAITING_TIME_PRESETS.contains(&seconds)
}

/// Comma separated preset list for messages
pub fn presets_list() -> String {
    WAITING_TIME_PRESETS
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_waiting_time() {
        let settings = Settings::default();
        assert_eq!(settings.checker_waiting_time, 5.0);
        assert_eq!(settings.waiting_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.set_waiting_time(45.0).unwrap();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.checker_waiting_time, 45.0);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_missing_key_uses_default_value() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.checker_waiting_time, DEFAULT_WAITING_TIME);
    }

    #[test]
    fn test_rejects_non_preset_waiting_time() {
        let mut settings = Settings::default();
        let err = settings.set_waiting_time(3.0).unwrap_err();
        assert!(err.to_string().contains("Invalid waiting time"));
        assert_eq!(settings.checker_waiting_time, 5.0);
    }

    #[test]
    fn test_negative_duration_clamps_to_zero() {
        let settings = Settings {
            checker_waiting_time: -1.0,
        };
        assert_eq!(settings.waiting_duration(), Duration::ZERO);
    }
}
