//! Error types for auditlog-merkle

use thiserror::Error;

/// Errors that can occur in Merkle proof verification
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed proof (wrong length, undecodable hashes)
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// Invalid tree size
    #[error("Invalid tree size: {0}")]
    InvalidTreeSize(String),

    /// Invalid leaf index
    #[error("Invalid leaf index: {0}")]
    InvalidLeafIndex(String),

    /// Recomputed root does not match the asserted one
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

/// Result type for Merkle operations
pub type Result<T> = std::result::Result<T, Error>;
