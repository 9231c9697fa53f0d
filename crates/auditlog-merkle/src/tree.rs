//! Merkle tree hashing utilities
//!
//! RFC 6962 hashing with domain separation prefixes (0x00 for leaves, 0x01
//! for interior nodes) over SHA-256.

use auditlog_types::{Sha256Hash, EMPTY_ROOT_HASH};
use sha2::{Digest, Sha256};

/// Prefix for leaf nodes
pub const LEAF_HASH_PREFIX: u8 = 0x00;

/// Prefix for internal nodes
pub const NODE_HASH_PREFIX: u8 = 0x01;

/// Hash size in bytes (SHA-256)
pub const HASH_SIZE: usize = 32;

/// Hash a leaf node
///
/// Returns: SHA256(0x00 || leaf_data)
pub fn hash_leaf(data: &[u8]) -> Sha256Hash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_HASH_PREFIX]);
    hasher.update(data);
    Sha256Hash::from_bytes(hasher.finalize().into())
}

/// Hash two child nodes to create a parent node
///
/// Returns: SHA256(0x01 || left || right)
pub fn hash_children(left: &Sha256Hash, right: &Sha256Hash) -> Sha256Hash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_HASH_PREFIX]);
    hasher.update(left.as_slice());
    hasher.update(right.as_slice());
    Sha256Hash::from_bytes(hasher.finalize().into())
}

/// Root hash of the tree with no leaves
pub fn empty_root() -> Sha256Hash {
    EMPTY_ROOT_HASH
}

/// Number of bits needed to represent `n`
pub(crate) fn bit_length(n: u64) -> u32 {
    64 - n.leading_zeros()
}
