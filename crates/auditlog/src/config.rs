//! Client configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Log id used when none is configured
pub const DEFAULT_LOG_ID: &str = "default";

/// Construction-time behavior of an [`crate::AuditClient`]
///
/// All fields have defaults, so a JSON file only needs the ones it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Sign every logged event
    pub sign_logs: bool,

    /// PKCS#8 PEM private key used when `sign_logs` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_key_path: Option<PathBuf>,

    /// Verify membership and consistency proofs returned by the service
    pub verify_proofs: bool,

    /// Do not check event signatures on search results
    pub skip_event_verification: bool,

    /// SPKI PEM public key trusted for event signatures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_key_path: Option<PathBuf>,

    /// Further SPKI PEM public keys trusted for event signatures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trusted_key_paths: Vec<PathBuf>,

    /// Treat an unsigned event, or one with no usable key, as invalid
    pub require_signatures: bool,

    /// Identifies the log (or tenant) in the roots provider
    pub log_id: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sign_logs: false,
            signing_key_path: None,
            verify_proofs: true,
            skip_event_verification: false,
            verification_key_path: None,
            trusted_key_paths: Vec::new(),
            require_signatures: false,
            log_id: DEFAULT_LOG_ID.to_string(),
        }
    }
}

impl AuditConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("failed to parse config {}: {}", path.display(), e))
        })
    }

    /// Sign logged events with the key at `path`
    pub fn with_signing_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.sign_logs = true;
        self.signing_key_path = Some(path.into());
        self
    }

    /// Trust the public key at `path` for event signatures
    pub fn with_verification_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.verification_key_path = Some(path.into());
        self
    }

    /// Additionally trust the public key at `path`
    pub fn with_trusted_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.trusted_key_paths.push(path.into());
        self
    }

    /// Enable or disable proof verification
    pub fn with_verify_proofs(mut self, verify_proofs: bool) -> Self {
        self.verify_proofs = verify_proofs;
        self
    }

    /// Enable or disable signature checks on search results
    pub fn with_skip_event_verification(mut self, skip: bool) -> Self {
        self.skip_event_verification = skip;
        self
    }

    /// Require every event to carry a verifiable signature
    pub fn with_require_signatures(mut self, require: bool) -> Self {
        self.require_signatures = require;
        self
    }

    /// Set the log id
    pub fn with_log_id(mut self, log_id: impl Into<String>) -> Self {
        self.log_id = log_id.into();
        self
    }

    /// Check that the flags are consistent with each other
    ///
    /// Key files are only checked for existence when the client loads them.
    pub fn validate(&self) -> Result<()> {
        if self.sign_logs && self.signing_key_path.is_none() {
            return Err(Error::Config(
                "sign_logs is set but no signing_key_path is configured".to_string(),
            ));
        }
        if self.require_signatures && self.skip_event_verification {
            return Err(Error::Config(
                "require_signatures cannot be combined with skip_event_verification".to_string(),
            ));
        }
        if self.log_id.is_empty() {
            return Err(Error::Config("log_id must not be empty".to_string()));
        }
        Ok(())
    }
}
