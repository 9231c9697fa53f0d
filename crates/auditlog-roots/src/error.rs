//! Error types for the roots crate

/// Result type for roots provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or storing roots
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored root belongs to a different log than the one requested
    #[error("Stored root is for log {found}, expected {expected}")]
    LogMismatch { expected: String, found: String },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
