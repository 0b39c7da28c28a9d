//! Target domain derivation from a crawl-root URL.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// The crawl root does not carry a recognizable `scheme://host` prefix.
#[derive(Debug, Error)]
#[error("invalid crawl root {url}: expected an http:// or https:// URL")]
pub struct InvalidRootUrl {
    /// The rejected URL string.
    pub url: String,
}

static DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(https?://[A-Za-z0-9.-]+(?::\d+)?)")
        .expect("BUG: hardcoded domain regex is invalid")
});

/// Scheme + host (+ optional port) prefix shared by every URL in one crawl.
///
/// Listing pages link with absolute paths (`/files/sub/`), so child URLs are
/// formed by concatenating this prefix with the href. Immutable for the
/// duration of a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDomain(String);

impl TargetDomain {
    /// Derives the target domain from a crawl-root URL.
    ///
    /// Matches the leading `https?://host` (with an optional `:port`, which
    /// listing servers on non-default ports require).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRootUrl`] when no `scheme://host` prefix is found.
    pub fn derive(url: &str) -> Result<Self, InvalidRootUrl> {
        DOMAIN_PATTERN
            .find(url)
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| InvalidRootUrl {
                url: url.to_string(),
            })
    }

    /// Returns the domain prefix as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Forms an absolute URL from a listing href (absolute path).
    #[must_use]
    pub fn join(&self, href: &str) -> String {
        format!("{}{href}", self.0)
    }

    /// Strips this domain prefix from `url`, if present.
    #[must_use]
    pub fn strip_prefix<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.0.as_str())
    }
}

impl fmt::Display for TargetDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_http_root() {
        let domain = TargetDomain::derive("http://example.com/files/").unwrap();
        assert_eq!(domain.as_str(), "http://example.com");
    }

    #[test]
    fn test_derive_https_root() {
        let domain = TargetDomain::derive("https://mirror.example.org/pub/iso/").unwrap();
        assert_eq!(domain.as_str(), "https://mirror.example.org");
    }

    #[test]
    fn test_derive_keeps_port() {
        let domain = TargetDomain::derive("http://127.0.0.1:8080/files/").unwrap();
        assert_eq!(domain.as_str(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_derive_rejects_missing_scheme() {
        let err = TargetDomain::derive("example.com/files/").unwrap_err();
        assert!(err.to_string().contains("example.com/files/"));
    }

    #[test]
    fn test_derive_rejects_other_scheme() {
        assert!(TargetDomain::derive("ftp://example.com/files/").is_err());
    }

    #[test]
    fn test_join_concatenates_absolute_href() {
        let domain = TargetDomain::derive("http://host/files/").unwrap();
        assert_eq!(domain.join("/files/a.zip"), "http://host/files/a.zip");
    }

    #[test]
    fn test_strip_prefix() {
        let domain = TargetDomain::derive("http://host/files/").unwrap();
        assert_eq!(
            domain.strip_prefix("http://host/files/a.zip"),
            Some("/files/a.zip")
        );
        assert_eq!(domain.strip_prefix("http://other/files/a.zip"), None);
    }
}
