//! Persistent completion ledger, scoped per crawl root.
//!
//! The ledger is what makes downloading idempotent across process restarts:
//! a URL recorded here has been fully written to disk at least once. Each
//! crawl root gets its own snapshot file under the ledger directory, named
//! by the root's normalized store name, so independent mirrors never share
//! state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::naming::url_store_name;

/// Errors from ledger storage operations.
///
/// These are fatal for the operation that hit them: without durable ledger
/// writes, resume detection cannot be trusted.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Failure creating, reading, or writing ledger storage.
    #[error("ledger IO error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be serialized or deserialized.
    #[error("ledger serialization error: {source}")]
    Serialize {
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl LedgerError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// On-disk snapshot format. Round-trips within this crate only.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerSnapshot {
    completed: Vec<String>,
}

/// Set of URLs already successfully downloaded for one crawl root.
///
/// Membership is exact URL string equality. That is safe here because every
/// URL flowing into the ledger is constructed through the single
/// `TargetDomain::join` path, so the same remote file always produces the
/// same string within one crate version.
#[derive(Debug)]
pub struct CompletionLedger {
    path: PathBuf,
    completed: Vec<String>,
    index: HashSet<String>,
}

impl CompletionLedger {
    /// Loads the ledger for `root_url` from `dir`.
    ///
    /// A missing snapshot file is an empty ledger, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if an existing snapshot cannot be read or
    /// parsed.
    #[instrument(skip(dir), fields(root = %root_url))]
    pub async fn load(dir: &Path, root_url: &str) -> Result<Self, LedgerError> {
        let path = dir.join(format!("{}.json", url_store_name(root_url)));

        let completed = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: LedgerSnapshot = serde_json::from_slice(&bytes)
                    .map_err(|source| LedgerError::Serialize { source })?;
                snapshot.completed
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(LedgerError::io(path, e)),
        };

        debug!(path = %path.display(), entries = completed.len(), "loaded ledger");

        let index = completed.iter().cloned().collect();
        Ok(Self {
            path,
            completed,
            index,
        })
    }

    /// True when `url` was already recorded as downloaded.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.index.contains(url)
    }

    /// Returns the number of recorded URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    /// True when nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Records `url` as downloaded and immediately persists the snapshot.
    ///
    /// The whole updated set is rewritten on every call (write to a temp
    /// file, rename over the previous snapshot), so a crash loses at most
    /// the in-flight file. Recording the same URL twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the snapshot cannot be serialized or
    /// written; the in-memory set is still updated so the current pass can
    /// proceed, but the caller should treat this as fatal for resume.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn mark_complete(&mut self, url: &str) -> Result<(), LedgerError> {
        if self.index.insert(url.to_string()) {
            self.completed.push(url.to_string());
        }
        self.persist().await
    }

    async fn persist(&self) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LedgerError::io(parent.to_path_buf(), e))?;
        }

        let snapshot = LedgerSnapshot {
            completed: self.completed.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|source| LedgerError::Serialize { source })?;

        // Temp-then-rename so a crash mid-write cannot corrupt the snapshot.
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| LedgerError::io(tmp_path.clone(), e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| LedgerError::io(self.path.clone(), e))?;

        Ok(())
    }
}
