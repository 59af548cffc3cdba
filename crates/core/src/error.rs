use thiserror::Error;

/// Result type alias for bookmark-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types shared by the bookmark crates
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Logging setup errors
    #[error("logging error: {0}")]
    Logging(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let io_err: Error = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"));
        assert_eq!(io_err.to_string(), "I/O error: file not found");

        let config_err: Error = Error::Config("port must be non-zero".to_string());
        assert_eq!(config_err.to_string(), "configuration error: port must be non-zero");

        let logging_err: Error = Error::Logging("subscriber already set".to_string());
        assert_eq!(logging_err.to_string(), "logging error: subscriber already set");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
