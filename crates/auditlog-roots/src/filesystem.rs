//! File system based roots provider

use std::path::{Path, PathBuf};

use auditlog_types::{Sha256Hash, TreeHead};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{default_roots_dir, Error, Result, RootsGetFuture, RootsOpFuture, RootsProvider};

/// On-disk form of a stored root
#[derive(Debug, Serialize, Deserialize)]
struct StoredRoot {
    /// The log the root belongs to
    log_id: String,
    /// Tree size
    size: u64,
    /// Root hash (hex)
    root_hash: Sha256Hash,
    /// When the root was stored
    observed_at: DateTime<Utc>,
}

/// File system based roots provider
///
/// Each log gets one JSON file named after the hex encoding of its id, so
/// arbitrary log ids never escape the directory.
///
/// # Directory Structure
///
/// ```text
/// roots_dir/
/// ├── 6d61696e.root.json
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct FileSystemRoots {
    /// Base directory for root files
    roots_dir: PathBuf,
}

impl FileSystemRoots {
    /// Create a provider at the specified directory
    ///
    /// The directory will be created if it doesn't exist when writing.
    pub fn new(roots_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            roots_dir: roots_dir.as_ref().to_path_buf(),
        })
    }

    /// Create a provider at the default platform-specific location
    ///
    /// See [`default_roots_dir`] for the exact locations.
    pub fn default_location() -> Result<Self> {
        Self::new(default_roots_dir()?)
    }

    /// Directory the roots are stored in
    pub fn dir(&self) -> &Path {
        &self.roots_dir
    }

    fn root_path(&self, log_id: &str) -> PathBuf {
        self.roots_dir
            .join(format!("{}.root.json", hex::encode(log_id)))
    }
}

impl RootsProvider for FileSystemRoots {
    fn last_known_root<'a>(&'a self, log_id: &'a str) -> RootsGetFuture<'a> {
        Box::pin(async move {
            let path = self.root_path(log_id);
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            let stored: StoredRoot = serde_json::from_str(&content)?;
            if stored.log_id != log_id {
                return Err(Error::LogMismatch {
                    expected: log_id.to_string(),
                    found: stored.log_id,
                });
            }

            tracing::debug!(
                "Loaded root for log {} (size {}, observed {})",
                log_id,
                stored.size,
                stored.observed_at
            );
            Ok(Some(TreeHead::new(stored.size, stored.root_hash)))
        })
    }

    fn store_root<'a>(&'a self, log_id: &'a str, root: TreeHead) -> RootsOpFuture<'a> {
        Box::pin(async move {
            fs::create_dir_all(&self.roots_dir).await?;

            let stored = StoredRoot {
                log_id: log_id.to_string(),
                size: root.size,
                root_hash: root.root_hash,
                observed_at: Utc::now(),
            };
            let json = serde_json::to_string_pretty(&stored)?;

            // Write then rename so a crash never leaves a truncated root behind
            let path = self.root_path(log_id);
            let tmp_path = path.with_extension("json.tmp");
            fs::write(&tmp_path, json).await?;
            fs::rename(&tmp_path, &path).await?;

            Ok(())
        })
    }

    fn clear<'a>(&'a self, log_id: &'a str) -> RootsOpFuture<'a> {
        Box::pin(async move {
            match fs::remove_file(self.root_path(log_id)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}
