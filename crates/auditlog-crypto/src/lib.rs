//! Cryptographic primitives for the audit log client
//!
//! This crate provides key generation, event signing, and signature
//! verification using aws-lc-rs as the cryptographic backend. Keys are
//! exchanged as PKCS#8 (private) and SubjectPublicKeyInfo (public) in PEM.

pub mod error;
pub mod hash;
pub mod keyring;
pub mod keys;
pub mod signing;
pub mod verification;

pub use error::{Error, Result};
pub use hash::sha256;
pub use keyring::Keyring;
pub use keys::{generate_key_pem, load_private_key, load_public_key, GeneratedKey};
pub use signing::{EventSigner, KeyPair, PublicKeyPem, Signature, SigningScheme};
pub use verification::{key_id, verify_signature, SignatureVerifier, VerificationKey};
