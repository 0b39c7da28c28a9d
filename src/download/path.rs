//! Mapping downloadable URLs to local file paths.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::crawl::TargetDomain;

/// Derives the local path a URL's bytes will be written to.
///
/// The TargetDomain prefix is stripped, the remainder percent-decoded and
/// treated as a path relative to `output_dir`, so the mirror reproduces the
/// server's directory layout. With `flat` set, only the final path segment
/// is kept and everything lands directly in `output_dir`.
///
/// Decoding failures fall back to the raw (still-encoded) remainder rather
/// than failing the download.
#[must_use]
pub fn local_path_for_url(
    domain: &TargetDomain,
    url: &str,
    output_dir: &Path,
    flat: bool,
) -> PathBuf {
    let remainder = domain.strip_prefix(url).unwrap_or(url);
    let remainder = remainder.trim_start_matches('/');

    let decoded = urlencoding::decode(remainder).map_or_else(
        |e| {
            debug!(remainder = %remainder, error = %e, "URL decoding failed, using raw path");
            remainder.to_string()
        },
        |d| d.into_owned(),
    );

    let relative = if flat {
        decoded.rsplit('/').next().unwrap_or(&decoded).to_string()
    } else {
        decoded
    };

    output_dir.join(relative)
}
