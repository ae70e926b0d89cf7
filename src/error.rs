//! Error types for the Gazelle client.

use thiserror::Error;

/// Main error type for all Gazelle operations.
#[derive(Debug, Error)]
pub enum GazelleError {
    /// Login was rejected, returned no session, or the session was
    /// rejected again after a fresh login.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An authenticated call returned a non-success application status.
    #[error("API error: {0}")]
    Api(String),

    /// Search found no matching release group or edition.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A caller-supplied argument was rejected before any I/O.
    #[error("{0}")]
    InvalidArgument(String),

    /// HTTP request failed.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Gazelle operations.
pub type Result<T> = std::result::Result<T, GazelleError>;
