//! In-memory roots provider

use std::collections::HashMap;
use std::sync::Arc;

use auditlog_types::TreeHead;
use tokio::sync::RwLock;

use crate::{RootsGetFuture, RootsOpFuture, RootsProvider};

/// In-memory roots provider
///
/// Roots live for the lifetime of the process. Clones share storage, so a
/// single instance can seed several clients talking to the same log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoots {
    roots: Arc<RwLock<HashMap<String, TreeHead>>>,
}

impl InMemoryRoots {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that already knows `root` for `log_id`
    pub fn with_root(log_id: impl Into<String>, root: TreeHead) -> Self {
        let mut roots = HashMap::new();
        roots.insert(log_id.into(), root);
        Self {
            roots: Arc::new(RwLock::new(roots)),
        }
    }

    /// Number of logs with a stored root
    pub async fn len(&self) -> usize {
        self.roots.read().await.len()
    }

    /// Whether no roots are stored
    pub async fn is_empty(&self) -> bool {
        self.roots.read().await.is_empty()
    }
}

impl RootsProvider for InMemoryRoots {
    fn last_known_root<'a>(&'a self, log_id: &'a str) -> RootsGetFuture<'a> {
        Box::pin(async move { Ok(self.roots.read().await.get(log_id).copied()) })
    }

    fn store_root<'a>(&'a self, log_id: &'a str, root: TreeHead) -> RootsOpFuture<'a> {
        Box::pin(async move {
            self.roots.write().await.insert(log_id.to_string(), root);
            Ok(())
        })
    }

    fn clear<'a>(&'a self, log_id: &'a str) -> RootsOpFuture<'a> {
        Box::pin(async move {
            self.roots.write().await.remove(log_id);
            Ok(())
        })
    }
}
