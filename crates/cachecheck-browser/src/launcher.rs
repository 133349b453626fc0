use crate::{Error, Result};
use cachecheck_core::urls;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

pub const DEFAULT_DEBUGGING_PORT: u16 = 9222;

/// Starts the Chrome process that serves as the browsing surface
pub struct ChromeLauncher {
    chrome_path: PathBuf,
    profile_path: PathBuf,
    start_url: Option<String>,
    debugging_port: u16,
}

impl ChromeLauncher {
    pub fn new(chrome_path: PathBuf, profile_path: PathBuf, start_url: Option<String>) -> Self {
        Self {
            chrome_path,
            profile_path,
            start_url,
            debugging_port: DEFAULT_DEBUGGING_PORT,
        }
    }

    pub fn with_debugging_port(mut self, port: u16) -> Self {
        self.debugging_port = port;
        self
    }

    pub fn launch(&self) -> Result<Child> {
        let args = self.build_args();
        tracing::debug!("Launching {} {:?}", self.chrome_path.display(), args);

        Command::new(&self.chrome_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Browser(format!("Failed to launch Chrome: {}", e)))
    }

    fn build_args(&self) -> Vec<String> {
        let start_url = match &self.start_url {
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                format!("https://{}", url)
            }
            Some(url) => url.clone(),
            None => urls::DEFAULT_START_URL.to_string(),
        };

        vec![
            format!("--remote-debugging-port={}", self.debugging_port),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            format!("--user-data-dir={}", self.profile_path.display()),
            start_url,
        ]
    }

    pub fn debugging_port(&self) -> u16 {
        self.debugging_port
    }
}
