//! No-op roots provider (nothing remembered)

use auditlog_types::TreeHead;

use crate::{RootsGetFuture, RootsOpFuture, RootsProvider};

/// A provider that never knows a root and discards stored ones
///
/// With this provider the client trusts the first root it observes in
/// each process.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoots;

impl RootsProvider for NoRoots {
    fn last_known_root<'a>(&'a self, _log_id: &'a str) -> RootsGetFuture<'a> {
        Box::pin(async { Ok(None) })
    }

    fn store_root<'a>(&'a self, _log_id: &'a str, _root: TreeHead) -> RootsOpFuture<'a> {
        Box::pin(async { Ok(()) })
    }

    fn clear<'a>(&'a self, _log_id: &'a str) -> RootsOpFuture<'a> {
        Box::pin(async { Ok(()) })
    }
}
