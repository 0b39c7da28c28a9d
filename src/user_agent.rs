//! Shared User-Agent string for crawl and download HTTP traffic.
//!
//! Single source for the UA format so listing fetches and file transfers
//! identify themselves consistently (good citizenship; RFC 9308).

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/nicksrandall/h5mirror";

/// Default User-Agent for all requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("h5mirror/{version} (listing-mirror-tool; +{PROJECT_UA_URL})")
}
