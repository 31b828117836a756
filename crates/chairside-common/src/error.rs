//! Error types shared across Chairside crates

use thiserror::Error;

/// Result type alias for Chairside operations
pub type Result<T> = std::result::Result<T, ChairsideError>;

/// Main error type for Chairside
#[derive(Error, Debug)]
pub enum ChairsideError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
