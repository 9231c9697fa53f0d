//! RFC 6962 Merkle tree verification for the audit log client
//!
//! This crate verifies inclusion (membership) and consistency proofs
//! supplied by the log service. It never builds trees itself.
//!
//! Hashing follows RFC 6962 with SHA-256:
//! - leaf hash: `SHA256(0x00 || leaf_data)`
//! - node hash: `SHA256(0x01 || left || right)`
//! - empty tree: `SHA256("")`

pub mod error;
pub mod proof;
pub mod tree;
pub mod verifier;

pub use error::{Error, Result};
pub use proof::{root_from_inclusion_proof, verify_consistency_proof, verify_inclusion_proof};
pub use tree::{empty_root, hash_children, hash_leaf, HASH_SIZE, LEAF_HASH_PREFIX, NODE_HASH_PREFIX};
pub use verifier::{decode_proof, verify_consistency, verify_membership, InclusionProof};
