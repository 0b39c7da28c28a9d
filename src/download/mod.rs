//! File download pass: URL-to-path mapping, skip detection, transfers.
//!
//! Full file downloads bypass the response cache — only listing pages are
//! cached. Idempotence comes from the completion ledger plus the on-disk
//! existence check instead.

mod engine;
mod error;
mod path;

pub use engine::{DEFAULT_WORKERS, Downloader, DownloadStats};
pub use error::DownloadError;
pub use path::local_path_for_url;
