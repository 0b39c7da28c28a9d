//! Batch orchestration: resolve work items, crawl each, gate, download.
//!
//! The orchestrator ties the crawler, cache, ledger, and downloader
//! together for one or more `(root URL, max depth)` work items. The
//! download phase is guarded by an injected confirmation predicate so the
//! flow is testable without terminal interaction.

mod worklist;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cache::{CacheError, ResponseCache};
use crate::crawl::{InvalidRootUrl, ListingCrawler, TargetDomain};
use crate::download::{DownloadError, DownloadStats, Downloader, local_path_for_url};
use crate::fetch::HttpClient;
use crate::ledger::{CompletionLedger, LedgerError};

pub use worklist::{WorkItem, WorklistError, work_items_from_file};

/// Errors from batch orchestration.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A work item's root URL has no recognizable `scheme://host` shape.
    #[error(transparent)]
    InvalidRoot(#[from] InvalidRootUrl),

    /// The URL list file could not be resolved into work items.
    #[error(transparent)]
    Worklist(#[from] WorklistError),

    /// Response-cache storage failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The download pass failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Completion-ledger storage failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Export file could not be written.
    #[error("cannot write export file {path}: {source}")]
    Export {
        /// The export destination.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// One crawled work item with its discovered downloadable URLs.
#[derive(Debug)]
pub struct CrawledItem {
    /// The originating work item.
    pub item: WorkItem,
    /// The domain every discovered URL shares.
    pub domain: TargetDomain,
    /// Downloadable URLs in discovery order.
    pub urls: Vec<String>,
}

/// Aggregate result of crawling a batch of work items.
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Per-item crawl results, in work-item order.
    pub items: Vec<CrawledItem>,
}

impl CrawlReport {
    /// Total downloadable files discovered across all items.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.items.iter().map(|item| item.urls.len()).sum()
    }
}

/// How a gated batch run ended.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Nothing downloadable was discovered; the gate was never consulted.
    NoFiles(CrawlReport),
    /// The confirmation gate refused; nothing was downloaded.
    Aborted(CrawlReport),
    /// The download phase ran to completion.
    Completed(CrawlReport, DownloadStats),
}

/// Drives crawl and download passes over a batch of work items.
pub struct BatchRunner {
    cache: ResponseCache,
    client: HttpClient,
    downloader: Downloader,
    ledger_dir: PathBuf,
    output_dir: PathBuf,
    flat: bool,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("ledger_dir", &self.ledger_dir)
            .field("output_dir", &self.output_dir)
            .field("flat", &self.flat)
            .finish_non_exhaustive()
    }
}

impl BatchRunner {
    /// Creates a runner over the given collaborators and storage layout.
    #[must_use]
    pub fn new(
        cache: ResponseCache,
        client: HttpClient,
        downloader: Downloader,
        ledger_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        flat: bool,
    ) -> Self {
        Self {
            cache,
            client,
            downloader,
            ledger_dir: ledger_dir.into(),
            output_dir: output_dir.into(),
            flat,
        }
    }

    /// Crawls every work item, failing fast on an invalid root URL.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidRoot`] for a root without a
    /// `scheme://host` prefix, or [`BatchError::Cache`] on storage failure.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn crawl(&self, items: &[WorkItem]) -> Result<CrawlReport, BatchError> {
        let crawler = ListingCrawler::new(&self.cache);
        let mut report = CrawlReport::default();

        for (index, item) in items.iter().enumerate() {
            info!(
                item = index + 1,
                total = items.len(),
                url = %item.url,
                depth = item.depth,
                "crawling listing tree"
            );
            let domain = TargetDomain::derive(&item.url)?;
            let urls = crawler.crawl(&domain, &item.url, item.depth).await?;
            info!(url = %item.url, files = urls.len(), "crawl finished");

            report.items.push(CrawledItem {
                item: item.clone(),
                domain,
                urls,
            });
        }

        Ok(report)
    }

    /// Downloads every crawled item's files, aggregating stats.
    ///
    /// Each item loads the completion ledger for its own crawl root, so
    /// independent roots resume independently.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Ledger`] or [`BatchError::Download`] when
    /// resume state cannot be loaded or persisted.
    #[instrument(skip(self, report), fields(total_files = report.total_files()))]
    pub async fn download(&self, report: &CrawlReport) -> Result<DownloadStats, BatchError> {
        let total = DownloadStats::new();

        for crawled in &report.items {
            let ledger = CompletionLedger::load(&self.ledger_dir, &crawled.item.url).await?;
            let stats = self
                .downloader
                .download(
                    &self.client,
                    &crawled.domain,
                    ledger,
                    &crawled.urls,
                    &self.output_dir,
                    self.flat,
                )
                .await?;
            total.absorb(&stats);
        }

        Ok(total)
    }

    /// Writes the discovered URLs to `path` instead of downloading them.
    ///
    /// Flat mode writes one URL per line; otherwise each line is
    /// `URL -> decoded/relative/path` showing where the mirror would place
    /// the file. Returns the number of URLs written.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Export`] if the file cannot be written.
    #[instrument(skip(self, report), fields(path = %path.display()))]
    pub async fn export(&self, report: &CrawlReport, path: &Path) -> Result<usize, BatchError> {
        let mut out = String::new();
        let mut count = 0;

        for crawled in &report.items {
            for url in &crawled.urls {
                if self.flat {
                    out.push_str(url);
                } else {
                    let local = local_path_for_url(&crawled.domain, url, Path::new(""), false);
                    out.push_str(&format!("{url} -> {}", local.display()));
                }
                out.push('\n');
                count += 1;
            }
        }

        tokio::fs::write(path, out)
            .await
            .map_err(|source| BatchError::Export {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), urls = count, "exported discovered URLs");
        Ok(count)
    }

    /// Runs the whole batch: crawl, gate, download.
    ///
    /// The confirmation `gate` is consulted once, after all items are
    /// crawled and only when something downloadable was found. Callers
    /// supply an interactive prompt, an always-yes policy, or anything in
    /// between.
    ///
    /// # Errors
    ///
    /// Propagates crawl and download errors; a refused gate is a normal
    /// [`BatchOutcome::Aborted`], not an error.
    pub async fn run(
        &self,
        items: &[WorkItem],
        gate: impl FnOnce(&CrawlReport) -> bool,
    ) -> Result<BatchOutcome, BatchError> {
        let report = self.crawl(items).await?;

        if report.total_files() == 0 {
            warn!("no downloadable files found");
            return Ok(BatchOutcome::NoFiles(report));
        }

        info!(total = report.total_files(), "total downloadable files");

        if !gate(&report) {
            info!("download not confirmed; aborting");
            return Ok(BatchOutcome::Aborted(report));
        }

        let stats = self.download(&report).await?;
        Ok(BatchOutcome::Completed(report, stats))
    }
}
