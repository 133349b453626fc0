use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Script evaluation threw or the page rejected the script
    #[error("Script error: {0}")]
    Script(String),

    /// Extracted log data could not be decoded
    #[error("Extract error: {0}")]
    Extract(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Challenge checks are still running ({0} queued)")]
    Busy(usize),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] cachecheck_core::Error),
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Script("ReferenceError: foo is not defined".to_string());
        assert_eq!(err.to_string(), "Script error: ReferenceError: foo is not defined");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: Error = cachecheck_core::Error::InvalidUrl("https://::".to_string()).into();
        assert_eq!(err.to_string(), "Invalid url: https://::");
    }
}
