//! Error types for the crate.

use thiserror::Error;

/// Crate error type.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error (index persistence).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding model failed to load or run.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A tool was called with bad arguments or is unknown.
    #[error("Tool error: {0}")]
    Tool(String),

    /// A document id already exists in the collection.
    #[error("Duplicate document id: {0}")]
    DuplicateId(String),

    /// The model response could not be interpreted.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// An agent run did not finish within its turn budget.
    #[error("Max turns ({0}) exceeded")]
    MaxTurnsExceeded(usize),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
