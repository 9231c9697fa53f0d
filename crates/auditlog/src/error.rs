//! Error types for auditlog

use auditlog_types::TreeHead;
use thiserror::Error;

/// Errors that can occur in audit client operations
///
/// An invalid signature or proof on a returned event is not an error; it
/// is reported as a [`crate::VerificationVerdict`] on the result.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing key material, or inconsistent configuration flags
    #[error("Configuration error: {0}")]
    Config(String),

    /// The log presented a root that is not an extension of the trusted one
    #[error("Root rollback: trusted {trusted}, service presented {observed}")]
    RootRollback {
        trusted: TreeHead,
        observed: TreeHead,
    },

    /// A strict helper found an event that did not fully verify
    #[error("Verification error: {0}")]
    Verification(String),

    /// Types error
    #[error("Types error: {0}")]
    Types(#[from] auditlog_types::Error),

    /// Crypto error
    #[error("Crypto error: {0}")]
    Crypto(#[from] auditlog_crypto::Error),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] auditlog_transport::Error),

    /// Roots provider error
    #[error("Roots provider error: {0}")]
    Roots(#[from] auditlog_roots::Error),
}

/// Result type for audit client operations
pub type Result<T> = std::result::Result<T, Error>;
