//! Error types for the crowded-cot system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crowded-cot system.
///
/// Missing or short history is not an error: it surfaces as `None` values
/// and `false` flags in the computed rows.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error. Fatal to a run, raised before any computation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or unreadable input).
    #[error("Data error: {0}")]
    Data(String),

    /// Remote fetch error.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading/writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Error::Fetch(msg.into())
    }

    /// Whether this error should abort a run before any output is written.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
