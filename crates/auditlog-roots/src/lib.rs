//! Pluggable storage for the last known root of an audit log
//!
//! The client's root tracker starts from the last root a trusted party has
//! seen for a log, so that a log which was rolled back while this process
//! was not running is still detected. This crate provides the storage for
//! that baseline:
//!
//! - [`FileSystemRoots`]: persisted on disk (default location or custom)
//! - [`InMemoryRoots`]: kept in-process, shared between clients
//! - [`NoRoots`]: nothing is remembered; the first observed root is trusted
//!
//! # Example
//!
//! ```no_run
//! use auditlog_roots::{FileSystemRoots, RootsProvider};
//! use auditlog_types::TreeHead;
//!
//! # async fn example() -> Result<(), auditlog_roots::Error> {
//! let roots = FileSystemRoots::default_location()?;
//!
//! if let Some(head) = roots.last_known_root("main").await? {
//!     println!("last seen {}", head);
//! }
//!
//! roots.store_root("main", TreeHead::empty()).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod filesystem;
mod memory;
mod noop;

pub use error::{Error, Result};
pub use filesystem::FileSystemRoots;
pub use memory::InMemoryRoots;
pub use noop::NoRoots;

use auditlog_types::TreeHead;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by [`RootsProvider::last_known_root`]
pub type RootsGetFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<TreeHead>>> + Send + 'a>>;

/// Future returned by the mutating [`RootsProvider`] operations
pub type RootsOpFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Source (and optional sink) of the last known root for a log
///
/// `log_id` names the log (or tenant) the root belongs to. A provider that
/// cannot persist simply ignores `store_root`.
pub trait RootsProvider: Send + Sync {
    /// The last root known for `log_id`, if any
    fn last_known_root<'a>(&'a self, log_id: &'a str) -> RootsGetFuture<'a>;

    /// Remember `root` as the last known root for `log_id`
    fn store_root<'a>(&'a self, log_id: &'a str, root: TreeHead) -> RootsOpFuture<'a>;

    /// Forget the root for `log_id`
    fn clear<'a>(&'a self, log_id: &'a str) -> RootsOpFuture<'a>;
}

impl<T: RootsProvider + ?Sized> RootsProvider for Arc<T> {
    fn last_known_root<'a>(&'a self, log_id: &'a str) -> RootsGetFuture<'a> {
        (**self).last_known_root(log_id)
    }

    fn store_root<'a>(&'a self, log_id: &'a str, root: TreeHead) -> RootsOpFuture<'a> {
        (**self).store_root(log_id, root)
    }

    fn clear<'a>(&'a self, log_id: &'a str) -> RootsOpFuture<'a> {
        (**self).clear(log_id)
    }
}

impl RootsProvider for Box<dyn RootsProvider> {
    fn last_known_root<'a>(&'a self, log_id: &'a str) -> RootsGetFuture<'a> {
        (**self).last_known_root(log_id)
    }

    fn store_root<'a>(&'a self, log_id: &'a str, root: TreeHead) -> RootsOpFuture<'a> {
        (**self).store_root(log_id, root)
    }

    fn clear<'a>(&'a self, log_id: &'a str) -> RootsOpFuture<'a> {
        (**self).clear(log_id)
    }
}

/// Get the default directory for persisted roots
///
/// This returns the platform-specific local data directory:
/// - Linux: `~/.local/share/auditlog-rs/roots/`
/// - macOS: `~/Library/Application Support/dev.auditlog.auditlog-rs/roots/`
/// - Windows: `C:\Users\<User>\AppData\Local\auditlog\auditlog-rs\data\roots\`
pub fn default_roots_dir() -> Result<std::path::PathBuf> {
    let project_dirs = directories::ProjectDirs::from("dev", "auditlog", "auditlog-rs")
        .ok_or_else(|| Error::Io("Could not determine data directory".into()))?;
    Ok(project_dirs.data_local_dir().join("roots"))
}
