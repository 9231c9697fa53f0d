//! Error types for auditlog-types

use thiserror::Error;

/// Errors that can occur in auditlog-types
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid hex/base64 encoding or wrong digest length
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Event could not be brought into canonical form
    #[error("Canonicalization error: {0}")]
    Canonicalization(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Result type for auditlog-types operations
pub type Result<T> = std::result::Result<T, Error>;
