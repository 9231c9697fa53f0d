//! Root tracking across calls
//!
//! The tracker remembers the last unpublished root the client has accepted
//! and only lets it move forward along a verified consistency proof. A root
//! that is smaller than the trusted one, or that the service cannot prove
//! extends it, is a rollback or fork and is reported without touching the
//! trusted state.

use crate::error::Result;
use auditlog_merkle::{decode_proof, verify_consistency};
use auditlog_roots::RootsProvider;
use auditlog_types::{Hex, TreeHead};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Outcome of presenting a root to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyResult {
    /// Nothing was trusted yet; the root is now the baseline
    NoPriorRoot,
    /// The root extends (or equals) the trusted one
    Consistent,
    /// The root does not extend the trusted one
    Inconsistent,
}

impl ConsistencyResult {
    /// Whether the root was accepted
    pub fn is_accepted(&self) -> bool {
        !matches!(self, ConsistencyResult::Inconsistent)
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    root: Option<TreeHead>,
    seeded: bool,
}

/// Last-known-root state for one log
pub struct RootTracker {
    log_id: String,
    provider: Arc<dyn RootsProvider>,
    state: Mutex<TrackerState>,
}

impl std::fmt::Debug for RootTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootTracker")
            .field("log_id", &self.log_id)
            .finish_non_exhaustive()
    }
}

impl RootTracker {
    /// Create a tracker for `log_id`, seeded lazily from `provider`
    pub fn new(log_id: impl Into<String>, provider: Arc<dyn RootsProvider>) -> Self {
        Self {
            log_id: log_id.into(),
            provider,
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// Take exclusive access to the tracked root
    ///
    /// The session should be held from the moment the trusted size is read
    /// (to send as `consistency_from`) until the returned root has been
    /// observed, so concurrent calls cannot interleave their updates.
    pub async fn lock(&self) -> Result<TrackerSession<'_>> {
        let mut state = self.state.lock().await;
        if !state.seeded {
            let baseline = self.provider.last_known_root(&self.log_id).await?;
            match baseline {
                Some(root) => tracing::info!("Seeded root for log {} at {}", self.log_id, root),
                None => tracing::info!("No known root for log {}", self.log_id),
            }
            state.root = baseline;
            state.seeded = true;
        }
        Ok(TrackerSession {
            tracker: self,
            state,
        })
    }

    /// The currently trusted root
    pub async fn current(&self) -> Result<Option<TreeHead>> {
        Ok(self.lock().await?.trusted())
    }

    /// Present a root and its consistency proof from the trusted root
    pub async fn observe(&self, root: TreeHead, proof: &[Hex]) -> Result<ConsistencyResult> {
        self.lock().await?.observe(root, proof).await
    }

    /// Forget the trusted root
    ///
    /// The persisted root is cleared too, so the next observed root becomes
    /// the new baseline in this process and after a restart.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.provider.clear(&self.log_id).await?;
        state.root = None;
        state.seeded = true;
        tracing::info!("Reset root tracker for log {}", self.log_id);
        Ok(())
    }
}

/// Exclusive access to a [`RootTracker`]'s state
pub struct TrackerSession<'a> {
    tracker: &'a RootTracker,
    state: MutexGuard<'a, TrackerState>,
}

impl TrackerSession<'_> {
    /// The currently trusted root
    pub fn trusted(&self) -> Option<TreeHead> {
        self.state.root
    }

    /// Tree size to ask the service to prove consistency from
    pub fn consistency_from(&self) -> Option<u64> {
        self.state.root.map(|root| root.size)
    }

    /// Present a root and its consistency proof from the trusted root
    ///
    /// The trusted root only changes when the result is accepted and the
    /// roots provider has stored the new root.
    pub async fn observe(&mut self, root: TreeHead, proof: &[Hex]) -> Result<ConsistencyResult> {
        let result = match self.state.root {
            None => ConsistencyResult::NoPriorRoot,
            Some(trusted) => check_extends(&trusted, &root, proof),
        };

        match result {
            ConsistencyResult::Inconsistent => {
                tracing::warn!(
                    "Log {} presented root {} inconsistent with trusted {:?}",
                    self.tracker.log_id,
                    root,
                    self.state.root
                );
            }
            _ => {
                if self.state.root != Some(root) {
                    self.tracker
                        .provider
                        .store_root(&self.tracker.log_id, root)
                        .await?;
                    tracing::debug!("Log {} advanced to {}", self.tracker.log_id, root);
                    self.state.root = Some(root);
                }
            }
        }

        Ok(result)
    }

    /// Check that an older root is a prefix of the trusted root
    ///
    /// Used for historical roots; never changes the trusted state.
    pub fn check_prefix(&self, older: TreeHead, proof: &[Hex]) -> ConsistencyResult {
        match self.state.root {
            None => ConsistencyResult::NoPriorRoot,
            Some(trusted) if older.size > trusted.size => ConsistencyResult::Inconsistent,
            Some(trusted) => check_extends(&older, &trusted, proof),
        }
    }
}

/// Whether `newer` is an append-only extension of `older`
pub(crate) fn check_extends(older: &TreeHead, newer: &TreeHead, proof: &[Hex]) -> ConsistencyResult {
    if newer.size < older.size {
        return ConsistencyResult::Inconsistent;
    }
    if newer.size == older.size {
        return if newer.root_hash == older.root_hash {
            ConsistencyResult::Consistent
        } else {
            ConsistencyResult::Inconsistent
        };
    }

    let proof = match decode_proof(proof) {
        Ok(proof) => proof,
        Err(e) => {
            tracing::warn!("Malformed consistency proof: {}", e);
            return ConsistencyResult::Inconsistent;
        }
    };

    if verify_consistency(older, newer, &proof) {
        ConsistencyResult::Consistent
    } else {
        ConsistencyResult::Inconsistent
    }
}
