//! Log roots
//!
//! A root commits to the full contents of the append-only log at a given
//! size. The wire forms ([`RootInfo`], [`PublishedRoot`]) keep the hash as
//! text so that a malformed value surfaces during verification rather than
//! while decoding the response; [`TreeHead`] is the decoded, trusted form
//! held by the root tracker and roots providers.

use crate::encoding::{Hex, Sha256Hash};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Root of the empty tree: SHA-256 of the empty string
pub const EMPTY_ROOT_HASH: Sha256Hash = Sha256Hash::from_bytes([
    0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f, 0xb9,
    0x24, 0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52,
    0xb8, 0x55,
]);

/// A decoded (tree size, root hash) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeHead {
    /// Number of leaves in the tree
    pub size: u64,
    /// Merkle root over those leaves
    pub root_hash: Sha256Hash,
}

impl TreeHead {
    /// Create a tree head
    pub fn new(size: u64, root_hash: Sha256Hash) -> Self {
        Self { size, root_hash }
    }

    /// The tree head of the empty log
    pub fn empty() -> Self {
        Self {
            size: 0,
            root_hash: EMPTY_ROOT_HASH,
        }
    }

    /// Whether this is the empty log
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl std::fmt::Display for TreeHead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.root_hash, self.size)
    }
}

/// Unpublished root as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootInfo {
    /// Tree size
    pub size: u64,
    /// Root hash (hex)
    pub root_hash: Hex,
}

impl RootInfo {
    /// Decode into a [`TreeHead`]
    pub fn tree_head(&self) -> Result<TreeHead> {
        Ok(TreeHead::new(self.size, self.root_hash.to_sha256()?))
    }
}

impl From<TreeHead> for RootInfo {
    fn from(head: TreeHead) -> Self {
        Self {
            size: head.size,
            root_hash: Hex::from(&head.root_hash),
        }
    }
}

/// Published (anchored) root as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRoot {
    /// Name of the tree the root belongs to
    pub tree_name: String,
    /// Tree size
    pub size: u64,
    /// Root hash (hex)
    pub root_hash: Hex,
    /// Where the root was anchored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When the root was anchored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Consistency proof linking this root to another root named by the request
    ///
    /// On `v1/root` the other root is `consistency_from`; on search results
    /// it is the unpublished root of the same response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_proof: Option<Vec<Hex>>,
}

impl PublishedRoot {
    /// Decode into a [`TreeHead`]
    pub fn tree_head(&self) -> Result<TreeHead> {
        Ok(TreeHead::new(self.size, self.root_hash.to_sha256()?))
    }
}
