use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Executable names looked up on `PATH` when no default location matches
const PATH_CANDIDATES: [&str; 3] = ["google-chrome", "chromium", "chromium-browser"];

/// Locates a Chrome binary to drive
pub struct ChromeFinder {
    custom_path: Option<PathBuf>,
}

impl ChromeFinder {
    pub fn new(custom_path: Option<PathBuf>) -> Self {
        Self { custom_path }
    }

    /// Find Chrome: the custom path if one was given, then the platform's
    /// usual install locations, then `PATH`.
    pub fn find(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.custom_path {
            return validate_chrome_path(path);
        }

        if let Some(path) = Self::default_paths()
            .into_iter()
            .find(|p| validate_chrome_path(p).is_ok())
        {
            return Ok(path);
        }

        if let Some(path) = PATH_CANDIDATES.iter().find_map(|name| which::which(name).ok()) {
            tracing::debug!("Found Chrome on PATH: {}", path.display());
            return Ok(path);
        }

        Err(Error::Browser(format!(
            "Chrome not found. Checked: {}, and {} on PATH. Use --chrome-path to specify location.",
            Self::default_paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            PATH_CANDIDATES.join("/")
        )))
    }

    fn default_paths() -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        return vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ];

        #[cfg(target_os = "linux")]
        return vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
        ];

        #[cfg(target_os = "windows")]
        return vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        return vec![];
    }
}

/// A usable Chrome path exists and, on unix, is executable
fn validate_chrome_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::Browser(format!(
            "Chrome not found at: {}",
            path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)?.permissions().mode();
        if mode & 0o111 == 0 {
            return Err(Error::Browser(format!(
                "Chrome binary not executable: {}",
                path.display()
            )));
        }
    }

    Ok(path.to_path_buf())
}
