//! Merkle proof verification
//!
//! Inclusion and consistency proof verification as specified in RFC 6962
//! (and its successor RFC 9162). Proof hashes are ordered from the leaf
//! level up to the root.

use crate::error::{Error, Result};
use crate::tree::{bit_length, hash_children};
use auditlog_types::Sha256Hash;

/// Recompute the root implied by an inclusion proof
///
/// # Arguments
/// * `leaf_hash` - The leaf hash of the entry
/// * `leaf_index` - Index of the leaf in the tree (0-based)
/// * `tree_size` - Total number of leaves in the tree
/// * `proof_hashes` - The audit path, leaf to root
pub fn root_from_inclusion_proof(
    leaf_hash: &Sha256Hash,
    leaf_index: u64,
    tree_size: u64,
    proof_hashes: &[Sha256Hash],
) -> Result<Sha256Hash> {
    if leaf_index >= tree_size {
        return Err(Error::InvalidLeafIndex(format!(
            "leaf index {} >= tree size {}",
            leaf_index, tree_size
        )));
    }

    let (inner, border) = decompose_inclusion_proof(leaf_index, tree_size);
    if proof_hashes.len() != inner + border {
        return Err(Error::InvalidProof(format!(
            "expected {} proof hashes for leaf {} in tree of size {}, got {}",
            inner + border,
            leaf_index,
            tree_size,
            proof_hashes.len()
        )));
    }

    let hash = chain_inner(leaf_hash, &proof_hashes[..inner], leaf_index);
    Ok(chain_border_right(&hash, &proof_hashes[inner..]))
}

/// Verify an inclusion proof for a leaf against an expected root
///
/// # Returns
/// * `Ok(())` if the proof is valid
/// * `Err(...)` describing why it is not
pub fn verify_inclusion_proof(
    leaf_hash: &Sha256Hash,
    leaf_index: u64,
    tree_size: u64,
    proof_hashes: &[Sha256Hash],
    expected_root: &Sha256Hash,
) -> Result<()> {
    if tree_size == 0 {
        return Err(Error::InvalidTreeSize(
            "tree size cannot be zero".to_string(),
        ));
    }

    let calculated = root_from_inclusion_proof(leaf_hash, leaf_index, tree_size, proof_hashes)?;
    if &calculated != expected_root {
        return Err(Error::HashMismatch {
            expected: expected_root.to_hex(),
            actual: calculated.to_hex(),
        });
    }

    Ok(())
}

/// Verify a consistency proof between two tree states
///
/// An empty old tree is consistent with every tree, provided the proof is
/// empty and the old root is the canonical empty root.
///
/// # Arguments
/// * `old_size` - Size of the older tree
/// * `new_size` - Size of the newer tree
/// * `proof_hashes` - The hashes in the consistency proof
/// * `old_root` - Root hash of the older tree
/// * `new_root` - Root hash of the newer tree
pub fn verify_consistency_proof(
    old_size: u64,
    new_size: u64,
    proof_hashes: &[Sha256Hash],
    old_root: &Sha256Hash,
    new_root: &Sha256Hash,
) -> Result<()> {
    if old_size > new_size {
        return Err(Error::InvalidTreeSize(format!(
            "old size {} > new size {}",
            old_size, new_size
        )));
    }

    if old_size == new_size {
        if !proof_hashes.is_empty() {
            return Err(Error::InvalidProof(
                "proof should be empty for same-size trees".to_string(),
            ));
        }
        if old_root != new_root {
            return Err(Error::HashMismatch {
                expected: old_root.to_hex(),
                actual: new_root.to_hex(),
            });
        }
        return Ok(());
    }

    if old_size == 0 {
        if !proof_hashes.is_empty() {
            return Err(Error::InvalidProof(
                "proof should be empty when old tree is empty".to_string(),
            ));
        }
        if old_root != &crate::tree::empty_root() {
            return Err(Error::HashMismatch {
                expected: crate::tree::empty_root().to_hex(),
                actual: old_root.to_hex(),
            });
        }
        return Ok(());
    }

    if proof_hashes.is_empty() {
        return Err(Error::InvalidProof(
            "proof cannot be empty for different-size trees".to_string(),
        ));
    }

    // The proof is the suffix of the inclusion proof for leaf old_size - 1,
    // starting at the level of the largest complete subtree on the border.
    let shift = old_size.trailing_zeros() as usize;
    let (inner, border) = decompose_inclusion_proof(old_size - 1, new_size);
    let inner = inner - shift;

    // The proof carries the root of that subtree unless old_size is exactly 2^shift
    let (seed, start) = if old_size == 1u64 << shift {
        (*old_root, 0)
    } else {
        (proof_hashes[0], 1)
    };

    let expected_len = start + inner + border;
    if proof_hashes.len() != expected_len {
        return Err(Error::InvalidProof(format!(
            "expected {} proof hashes, got {}",
            expected_len,
            proof_hashes.len()
        )));
    }

    let proof = &proof_hashes[start..];
    let mask = (old_size - 1) >> shift;

    let hash1 = chain_inner_right(&seed, &proof[..inner], mask);
    let calc_old_root = chain_border_right(&hash1, &proof[inner..]);
    if &calc_old_root != old_root {
        return Err(Error::HashMismatch {
            expected: old_root.to_hex(),
            actual: calc_old_root.to_hex(),
        });
    }

    let hash2 = chain_inner(&seed, &proof[..inner], mask);
    let calc_new_root = chain_border_right(&hash2, &proof[inner..]);
    if &calc_new_root != new_root {
        return Err(Error::HashMismatch {
            expected: new_root.to_hex(),
            actual: calc_new_root.to_hex(),
        });
    }

    Ok(())
}

/// Split an inclusion proof into inner and border path lengths
///
/// Returns (inner_path_length, border_path_length)
fn decompose_inclusion_proof(index: u64, tree_size: u64) -> (usize, usize) {
    let inner = inner_proof_size(index, tree_size);
    let border = (index >> inner).count_ones() as usize;
    (inner, border)
}

/// Number of levels at which the paths to `index` and to the last leaf differ
fn inner_proof_size(index: u64, tree_size: u64) -> usize {
    bit_length(index ^ (tree_size - 1)) as usize
}

/// Chain hashes along the inner proof path
fn chain_inner(seed: &Sha256Hash, proof: &[Sha256Hash], index: u64) -> Sha256Hash {
    let mut hash = *seed;
    for (i, p) in proof.iter().enumerate() {
        if (index >> i) & 1 == 0 {
            hash = hash_children(&hash, p);
        } else {
            hash = hash_children(p, &hash);
        }
    }
    hash
}

/// Chain only the left siblings along the inner path (right edge of the old tree)
fn chain_inner_right(seed: &Sha256Hash, proof: &[Sha256Hash], index: u64) -> Sha256Hash {
    let mut hash = *seed;
    for (i, p) in proof.iter().enumerate() {
        if (index >> i) & 1 == 1 {
            hash = hash_children(p, &hash);
        }
    }
    hash
}

/// Chain hashes along the right border (all proof hashes go on the left)
fn chain_border_right(seed: &Sha256Hash, proof: &[Sha256Hash]) -> Sha256Hash {
    let mut hash = *seed;
    for p in proof {
        hash = hash_children(p, &hash);
    }
    hash
}
