//! Error types for trellis.

use thiserror::Error;

/// Result type for trellis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for trellis operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid diagnosis configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Evaluation payload failed to parse.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}
