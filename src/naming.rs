//! Filesystem-safe names for URL-keyed on-disk stores.
//!
//! The response cache and the completion ledger both key their files by a
//! normalized URL. They must share one normalization so a crawl root and its
//! cached pages resolve to the same names across runs.

/// Normalizes a URL into a filesystem-safe store name.
///
/// Strips a leading `http://` or `https://` and replaces every path
/// separator with `_`. The result is stable across runs for the same URL.
///
/// # Example
///
/// ```
/// use h5mirror_core::naming::url_store_name;
///
/// assert_eq!(
///     url_store_name("https://example.com/files/sub/"),
///     "example.com_files_sub_"
/// );
/// ```
#[must_use]
pub fn url_store_name(url: &str) -> String {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    stripped.replace('/', "_")
}
