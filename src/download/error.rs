//! Error types for the download pass.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Minimum allowed worker count.
pub(crate) const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub(crate) const MAX_WORKERS: usize = 64;

/// Errors from the download pass as a whole.
///
/// Individual file-transfer failures are NOT represented here: they are
/// logged, counted in the stats, and the batch continues, leaving the URL
/// eligible for retry on the next run.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Invalid worker count supplied to the downloader.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Completion-ledger persistence failed; resume state can no longer be
    /// trusted, so the pass aborts.
    #[error("ledger update failed: {0}")]
    Ledger(#[from] LedgerError),

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}
