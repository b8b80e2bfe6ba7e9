//! Error types for the cyclecast_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cyclecast_core operations
///
/// Sparse history is not an error: the predictor reports it as a normal
/// forecast with no date and a status message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A record or date reached the core in a shape it cannot reason about
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record lookup failed for the requesting user
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
