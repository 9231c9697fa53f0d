//! Keyring for managing multiple verification keys
//!
//! A keyring holds every public key the client trusts for event
//! signatures, indexed by key id, so that events signed before a key
//! rotation still verify.

use crate::verification::{SignatureVerifier, VerificationKey};
use std::collections::HashMap;

/// A keyring containing multiple verification keys
#[derive(Debug, Clone, Default)]
pub struct Keyring {
    /// Keys indexed by key id (hex SHA-256 of SPKI DER)
    keys: HashMap<String, VerificationKey>,
}

impl Keyring {
    /// Create a new empty keyring
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Add a key to the keyring, returning its key id
    pub fn add_key(&mut self, key: VerificationKey) -> String {
        let key_id = key.key_id();
        self.keys.insert(key_id.clone(), key);
        key_id
    }

    /// Get a key by id
    pub fn get_key(&self, key_id: &str) -> Option<&VerificationKey> {
        self.keys.get(key_id)
    }

    /// Whether a key with the same SPKI is already trusted
    pub fn contains(&self, key: &VerificationKey) -> bool {
        self.keys.contains_key(&key.key_id())
    }

    /// Try to verify a signature with any key in the keyring
    ///
    /// Returns the id of the key that verified it.
    pub fn verify_any(&self, data: &[u8], signature: &[u8]) -> Option<&str> {
        self.keys
            .iter()
            .find(|(_, key)| key.verify(data, signature))
            .map(|(id, _)| id.as_str())
    }

    /// Get the number of keys in the keyring
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the keyring is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SignatureVerifier for Keyring {
    fn verify(&self, canonical: &[u8], signature: &[u8]) -> bool {
        self.verify_any(canonical, signature).is_some()
    }
}
