//! Error types for auditlog-transport

use thiserror::Error;

/// Errors that can occur while talking to the service
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request error (connection, timeout, undecodable body)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with a non-success status
    #[error("API error: {status}: {summary} (request {request_id})")]
    Api {
        status: String,
        summary: String,
        request_id: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid transport configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, Error>;
