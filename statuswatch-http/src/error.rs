//! Error taxonomy for hub state sources.
//!
//! There is no fatal class here: every variant degrades to "state
//! unknown this tick" at the poll loop, which logs and tries again.

use thiserror::Error;

/// Errors that can occur when fetching state from the hub.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The hub answered with a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The response body could not be parsed.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// A well-formed response was missing an expected field.
    /// Treated as a fetch failure upstream, never a crash.
    #[error("missing expected field: {0}")]
    MissingField(&'static str),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::Connection(err.to_string())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}
