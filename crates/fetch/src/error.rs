//! Errors returned while fetching a page

use thiserror::Error;

/// Errors that can occur while fetching a page
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL could not be parsed
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport failure: connection, TLS, timeout, body read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("response failed with status code: {status}\nbody: {body}")]
    Status { status: u16, body: String },

    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl { url: url.into(), reason: reason.to_string() }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::Status { status: 404, body: "not here".into() };
        assert_eq!(err.to_string(), "response failed with status code: 404\nbody: not here");

        let err = FetchError::invalid_url("not a url", "relative URL without a base");
        assert_eq!(err.to_string(), "invalid url \"not a url\": relative URL without a base");
        assert!(FetchError::Cancelled.is_cancelled());
    }
}
