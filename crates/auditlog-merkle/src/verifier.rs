//! Verdict-level proof checks
//!
//! The functions in [`crate::proof`] report *why* a proof fails. The client
//! only needs to know *whether* it holds, and must never abort an operation
//! because the service sent a malformed proof, so these wrappers collapse
//! every failure into `false` and log the reason.

use crate::error::{Error, Result};
use crate::proof::{verify_consistency_proof, verify_inclusion_proof};
use crate::tree::hash_leaf;
use auditlog_types::{Hex, Sha256Hash, TreeHead};

/// An inclusion proof for a single leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    /// Position of the leaf in the tree
    pub leaf_index: u64,
    /// Audit path, leaf to root
    pub hashes: Vec<Sha256Hash>,
}

impl InclusionProof {
    /// Create an inclusion proof
    pub fn new(leaf_index: u64, hashes: Vec<Sha256Hash>) -> Self {
        Self { leaf_index, hashes }
    }

    /// Decode an inclusion proof from its wire form
    pub fn from_wire(leaf_index: u64, hashes: &[Hex]) -> Result<Self> {
        Ok(Self::new(leaf_index, decode_proof(hashes)?))
    }
}

/// Decode a list of hex proof hashes
pub fn decode_proof(hashes: &[Hex]) -> Result<Vec<Sha256Hash>> {
    hashes
        .iter()
        .enumerate()
        .map(|(i, h)| {
            h.to_sha256()
                .map_err(|e| Error::InvalidProof(format!("proof hash {}: {}", i, e)))
        })
        .collect()
}

/// Check that `leaf_data` is included in the tree described by `root`
pub fn verify_membership(leaf_data: &[u8], proof: &InclusionProof, root: &TreeHead) -> bool {
    let leaf_hash = hash_leaf(leaf_data);
    match verify_inclusion_proof(
        &leaf_hash,
        proof.leaf_index,
        root.size,
        &proof.hashes,
        &root.root_hash,
    ) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(
                "Membership proof for leaf {} against {} failed: {}",
                proof.leaf_index,
                root,
                e
            );
            false
        }
    }
}

/// Check that `new` is an append-only extension of `old`
pub fn verify_consistency(old: &TreeHead, new: &TreeHead, proof: &[Sha256Hash]) -> bool {
    match verify_consistency_proof(old.size, new.size, proof, &old.root_hash, &new.root_hash) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Consistency proof from {} to {} failed: {}", old, new, e);
            false
        }
    }
}
