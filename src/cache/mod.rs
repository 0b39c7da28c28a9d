//! On-disk response cache for listing pages.
//!
//! Maps a normalized URL (see [`crate::naming::url_store_name`]) to the raw
//! bytes last fetched for it, so repeated crawls of the same listing tree
//! touch the network only for pages never seen before. Entries are never
//! invalidated or expired here; deleting the cache directory is the
//! operator's tool for forcing a refetch.
//!
//! Failed fetches are NOT persisted. The result is tagged
//! [`PageSource::FailedFetch`] and the next `fetch_page` for the same URL
//! retries the network, so a transient outage cannot masquerade as a
//! permanently empty page across runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::fetch::Fetcher;
use crate::naming::url_store_name;

/// Errors from cache storage operations.
///
/// Network failures are not represented here: they degrade to
/// [`PageSource::FailedFetch`] instead. A storage failure means idempotence
/// can no longer be guaranteed, so it surfaces to the caller.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failure creating, reading, or writing cache storage.
    #[error("cache IO error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Where a page's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    /// Served from the on-disk cache; no network access happened.
    Cache,
    /// Fetched from the network and persisted.
    Network,
    /// The network fetch failed; the bytes are empty and nothing was persisted.
    FailedFetch,
}

/// A listing page as returned by the cache.
#[derive(Debug, Clone)]
pub struct Page {
    /// Raw response bytes (empty for a failed fetch).
    pub bytes: Vec<u8>,
    /// Provenance of the bytes.
    pub source: PageSource,
}

impl Page {
    /// True when the fetch failed and the bytes are a placeholder.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.source == PageSource::FailedFetch
    }
}

/// Content-addressed on-disk store of listing-page responses.
///
/// # Concurrency
///
/// The read-or-fetch-then-store sequence is atomic per URL key: concurrent
/// `fetch_page` calls for the same URL serialize on a per-key lock, so a
/// page is fetched at most once even under parallel crawls (single-flight).
pub struct ResponseCache {
    dir: PathBuf,
    fetcher: Arc<dyn Fetcher>,
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    /// Creates a cache rooted at `dir`, fetching misses through `fetcher`.
    ///
    /// The directory is created lazily on the first miss.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            dir: dir.into(),
            fetcher,
            inflight: DashMap::new(),
        }
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the bytes for `url`, from disk if seen before, else the network.
    ///
    /// A cache hit performs zero network calls and returns the stored bytes
    /// unchanged. A miss fetches, persists on success, and returns the fresh
    /// bytes. A failed fetch returns empty bytes tagged
    /// [`PageSource::FailedFetch`]; callers treat that as "no links found".
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if cache storage cannot be created, read,
    /// or written.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<Page, CacheError> {
        let key = url_store_name(url);

        // Single-flight: concurrent requests for the same key wait here
        // instead of fetching the same page twice.
        let lock = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let entry_path = self.dir.join(&key);

        match tokio::fs::read(&entry_path).await {
            Ok(bytes) => {
                debug!(key = %key, bytes = bytes.len(), "cache hit");
                return Ok(Page {
                    bytes,
                    source: PageSource::Cache,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::io(entry_path, e)),
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::io(self.dir.clone(), e))?;

        match self.fetcher.fetch(url).await {
            Ok(bytes) => {
                tokio::fs::write(&entry_path, &bytes)
                    .await
                    .map_err(|e| CacheError::io(entry_path, e))?;
                debug!(key = %key, bytes = bytes.len(), "fetched and cached");
                Ok(Page {
                    bytes,
                    source: PageSource::Network,
                })
            }
            Err(e) => {
                warn!(url = %url, error = %e, "listing fetch failed; treating as empty page");
                Ok(Page {
                    bytes: Vec::new(),
                    source: PageSource::FailedFetch,
                })
            }
        }
    }
}
