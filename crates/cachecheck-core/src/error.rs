use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid waiting time: {0}s (allowed: {1})")]
    InvalidWaitingTime(f64, String),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

pub type Result<T> = std::result::Result<T, Error>;
