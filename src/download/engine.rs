//! Concurrent download pass over a crawl's downloadable URLs.
//!
//! The downloader maps each URL to a local path, skips work the completion
//! ledger proves is already done, streams the rest to disk with a bounded
//! worker pool, and records every confirmed success in the ledger.
//!
//! # Example
//!
//! ```no_run
//! use h5mirror_core::crawl::TargetDomain;
//! use h5mirror_core::download::Downloader;
//! use h5mirror_core::fetch::HttpClient;
//! use h5mirror_core::ledger::CompletionLedger;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let domain = TargetDomain::derive("http://host/files/")?;
//! let ledger = CompletionLedger::load(Path::new("downloaded_db"), "http://host/files/").await?;
//! let downloader = Downloader::new(4)?;
//! let client = HttpClient::new();
//! let urls = vec!["http://host/files/a.zip".to_string()];
//! let stats = downloader
//!     .download(&client, &domain, ledger, &urls, Path::new("./files"), false)
//!     .await?;
//! println!("downloaded {}, skipped {}", stats.downloaded(), stats.skipped());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, instrument, warn};

use super::error::{DownloadError, MAX_WORKERS, MIN_WORKERS};
use super::path::local_path_for_url;
use crate::crawl::TargetDomain;
use crate::fetch::HttpClient;
use crate::ledger::CompletionLedger;

/// Default worker count if not specified.
pub const DEFAULT_WORKERS: usize = 4;

/// Statistics from one download pass.
///
/// Uses atomic counters for thread-safe updates from concurrent workers.
#[derive(Debug, Default)]
pub struct DownloadStats {
    downloaded: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of files transferred this pass.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded.load(Ordering::SeqCst)
    }

    /// Returns the number of files skipped as already complete.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Returns the number of failed transfers.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the total number of URLs processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded() + self.skipped() + self.failed()
    }

    fn increment_downloaded(&self) {
        self.downloaded.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Folds another pass's counts into this one.
    pub fn absorb(&self, other: &DownloadStats) {
        self.downloaded
            .fetch_add(other.downloaded(), Ordering::SeqCst);
        self.skipped.fetch_add(other.skipped(), Ordering::SeqCst);
        self.failed.fetch_add(other.failed(), Ordering::SeqCst);
    }
}

/// Semaphore-bounded download worker pool.
///
/// # Concurrency model
///
/// - Each URL is processed in its own Tokio task, gated by a semaphore
///   permit (RAII release).
/// - The exists-on-disk and ledger-membership checks run together inside
///   the worker immediately before the transfer, so the skip decision is a
///   consistent per-URL snapshot.
/// - Ledger updates are serialized behind a mutex: every update rewrites
///   the full snapshot, and unsynchronized writers would lose entries.
#[derive(Debug)]
pub struct Downloader {
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl Downloader {
    /// Creates a downloader with the given worker-pool size (1-64).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidWorkers`] if the value is outside
    /// the valid range.
    pub fn new(workers: usize) -> Result<Self, DownloadError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(DownloadError::InvalidWorkers { value: workers });
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        })
    }

    /// Returns the configured worker-pool size.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Downloads `urls` under `output_dir`, recording successes in `ledger`.
    ///
    /// For each URL, in discovery order: the local path is derived and its
    /// parent directories created (before any existence check, so first
    /// runs don't trip on missing directories); the URL is skipped iff the
    /// file exists on disk AND the ledger records it complete; otherwise
    /// the file is streamed to disk — bypassing the response cache — and
    /// marked complete only after a confirmed write.
    ///
    /// A failed transfer is logged and counted; the pass continues and the
    /// URL stays eligible for retry on the next run.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Ledger`] if completion state cannot be
    /// persisted — resume cannot be guaranteed, so the pass aborts.
    #[instrument(skip(self, client, domain, ledger, urls), fields(urls = urls.len(), output_dir = %output_dir.display()))]
    pub async fn download(
        &self,
        client: &HttpClient,
        domain: &TargetDomain,
        ledger: CompletionLedger,
        urls: &[String],
        output_dir: &Path,
        flat: bool,
    ) -> Result<DownloadStats, DownloadError> {
        let stats = Arc::new(DownloadStats::new());
        let ledger = Arc::new(Mutex::new(ledger));
        let mut handles = Vec::with_capacity(urls.len());

        info!(total = urls.len(), "starting download pass");

        for url in urls {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DownloadError::SemaphoreClosed)?;

            let client = client.clone();
            let domain = domain.clone();
            let ledger = Arc::clone(&ledger);
            let stats = Arc::clone(&stats);
            let url = url.clone();
            let path = local_path_for_url(&domain, &url, output_dir, flat);

            handles.push(tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = permit;

                process_url(&client, &ledger, &stats, &url, &path).await
            }));
        }

        debug!(task_count = handles.len(), "waiting for transfers");

        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "download task panicked");
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            downloaded = stats.downloaded(),
            skipped = stats.skipped(),
            failed = stats.failed(),
            "download pass complete"
        );

        match Arc::try_unwrap(stats) {
            Ok(stats) => Ok(stats),
            Err(arc_stats) => {
                // All tasks are joined, so this branch should be unreachable;
                // rebuild from the atomic values if it ever is not.
                let fresh = DownloadStats::new();
                fresh.absorb(&arc_stats);
                Ok(fresh)
            }
        }
    }
}

/// Handles one URL: skip, or transfer and record.
async fn process_url(
    client: &HttpClient,
    ledger: &Mutex<CompletionLedger>,
    stats: &DownloadStats,
    url: &str,
    path: &Path,
) -> Result<(), DownloadError> {
    // Parent directories first: the existence check below must not race a
    // missing tree on first run.
    if let Some(parent) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            warn!(path = %path.display(), error = %e, "could not create directory");
            stats.increment_failed();
            return Ok(());
        }
    }

    let on_disk = tokio::fs::try_exists(path).await.unwrap_or(false);
    let recorded = ledger.lock().await.contains(url);

    if on_disk && recorded {
        info!(path = %path.display(), "skipping (already downloaded)");
        stats.increment_skipped();
        return Ok(());
    }

    info!(url = %url, path = %path.display(), "downloading");
    match client.download_to_path(url, path).await {
        Ok(_bytes) => {
            ledger.lock().await.mark_complete(url).await?;
            stats.increment_downloaded();
        }
        Err(e) => {
            warn!(url = %url, error = %e, "transfer failed; will retry next run");
            stats.increment_failed();
        }
    }

    Ok(())
}
