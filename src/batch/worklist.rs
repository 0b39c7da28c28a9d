//! Work-item resolution: single URLs and URL-list files.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

/// One crawl to perform: a root URL and its maximum recursion depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// The crawl-root URL.
    pub url: String,
    /// Maximum recursion depth for this root.
    pub depth: u32,
}

impl WorkItem {
    /// Creates a work item.
    #[must_use]
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// Errors resolving work items from a list file.
#[derive(Debug, Error)]
pub enum WorklistError {
    /// The list file is missing or unreadable.
    #[error("cannot read URL list {path}: {source}")]
    Unreadable {
        /// The list file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A line carried a depth field that is not a non-negative integer.
    #[error("invalid depth '{value}' in list line: {line}")]
    InvalidDepth {
        /// The offending depth token.
        value: String,
        /// The full offending line.
        line: String,
    },
}

/// Reads work items from a list file: one `URL [depth]` per line.
///
/// Blank lines are skipped. A line without a depth field takes
/// `default_depth`. A non-integer depth is rejected — silently defaulting
/// would mask typos like `http://host/ five`.
///
/// # Errors
///
/// Returns [`WorklistError`] if the file cannot be read or a depth field
/// does not parse.
#[instrument(skip(path), fields(path = %path.display()))]
pub async fn work_items_from_file(
    path: &Path,
    default_depth: u32,
) -> Result<Vec<WorkItem>, WorklistError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| WorklistError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let mut items = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let Some(url) = fields.next() else { continue };

        let depth = match fields.next() {
            Some(token) => token.parse().map_err(|_| WorklistError::InvalidDepth {
                value: token.to_string(),
                line: line.to_string(),
            })?,
            None => default_depth,
        };

        items.push(WorkItem::new(url, depth));
    }

    debug!(items = items.len(), "resolved work items from list file");
    Ok(items)
}
