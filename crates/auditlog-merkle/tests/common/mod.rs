//! Reference RFC 6962 tree used to generate proofs for the verifier tests
//!
//! This is a direct transcription of the recursive definitions in
//! RFC 6962 section 2.1 (MTH, PATH, SUBPROOF). It is quadratic and only
//! suitable for small trees.

use auditlog_merkle::{empty_root, hash_children, hash_leaf};
use auditlog_types::{Sha256Hash, TreeHead};

/// An in-memory tree over raw leaf data
pub struct ReferenceTree {
    leaves: Vec<Sha256Hash>,
}

impl ReferenceTree {
    /// Build a tree whose leaves are `leaf-0`, `leaf-1`, ...
    pub fn with_size(n: u64) -> Self {
        let mut tree = ReferenceTree { leaves: Vec::new() };
        for i in 0..n {
            tree.push(&leaf_data(i));
        }
        tree
    }

    pub fn push(&mut self, data: &[u8]) {
        self.leaves.push(hash_leaf(data));
    }

    pub fn head(&self) -> TreeHead {
        self.head_at(self.leaves.len() as u64)
    }

    pub fn head_at(&self, size: u64) -> TreeHead {
        TreeHead::new(size, mth(&self.leaves[..size as usize]))
    }

    /// Inclusion path for leaf `m` in the first `size` leaves
    pub fn inclusion_proof(&self, m: u64, size: u64) -> Vec<Sha256Hash> {
        path(m as usize, &self.leaves[..size as usize])
    }

    /// Consistency proof from `old` leaves to `new` leaves
    pub fn consistency_proof(&self, old: u64, new: u64) -> Vec<Sha256Hash> {
        if old == 0 || old == new {
            return Vec::new();
        }
        subproof(old as usize, &self.leaves[..new as usize], true)
    }
}

pub fn leaf_data(i: u64) -> Vec<u8> {
    format!("leaf-{}", i).into_bytes()
}

fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k << 1 < n {
        k <<= 1;
    }
    k
}

fn mth(leaves: &[Sha256Hash]) -> Sha256Hash {
    match leaves.len() {
        0 => empty_root(),
        1 => leaves[0],
        n => {
            let k = split_point(n);
            hash_children(&mth(&leaves[..k]), &mth(&leaves[k..]))
        }
    }
}

fn path(m: usize, leaves: &[Sha256Hash]) -> Vec<Sha256Hash> {
    let n = leaves.len();
    if n <= 1 {
        return Vec::new();
    }
    let k = split_point(n);
    if m < k {
        let mut p = path(m, &leaves[..k]);
        p.push(mth(&leaves[k..]));
        p
    } else {
        let mut p = path(m - k, &leaves[k..]);
        p.push(mth(&leaves[..k]));
        p
    }
}

fn subproof(m: usize, leaves: &[Sha256Hash], complete: bool) -> Vec<Sha256Hash> {
    let n = leaves.len();
    if m == n {
        return if complete { Vec::new() } else { vec![mth(leaves)] };
    }
    let k = split_point(n);
    if m <= k {
        let mut p = subproof(m, &leaves[..k], complete);
        p.push(mth(&leaves[k..]));
        p
    } else {
        let mut p = subproof(m - k, &leaves[k..], false);
        p.push(mth(&leaves[..k]));
        p
    }
}
