//! Depth-bounded traversal of directory-listing trees.

use tracing::{debug, instrument, trace};

use super::domain::TargetDomain;
use super::listing::{ListingLink, listing_links};
use crate::cache::{CacheError, ResponseCache};

/// Recursive listing walker producing the flat set of downloadable URLs.
///
/// The walk is depth-first and pre-order: a sub-listing's leaves land in the
/// result before later leaves of the page that linked it, exactly as a
/// direct recursive implementation would order them. Duplicates are kept.
///
/// # Loop prevention
///
/// There is deliberately no visited set. Hrefs starting with `..` are
/// dropped at parse time, and the recursion depth bound is the only other
/// guard: a listing server with self-referential links terminates because
/// every revisit costs a depth level, not because the URL was seen before.
#[derive(Debug)]
pub struct ListingCrawler<'a> {
    cache: &'a ResponseCache,
}

/// One pending traversal step.
///
/// `Emit` steps interleave with `Visit` steps on the stack so that leaf
/// ordering matches recursive pre-order without native recursion (and its
/// stack-depth limit).
enum Step {
    Visit { url: String, depth: u32 },
    Emit { url: String },
}

impl<'a> ListingCrawler<'a> {
    /// Creates a crawler reading pages through `cache`.
    #[must_use]
    pub fn new(cache: &'a ResponseCache) -> Self {
        Self { cache }
    }

    /// Walks the listing tree under `root_url`, collecting downloadable URLs.
    ///
    /// Nodes deeper than `max_depth` are silently truncated: the last fully
    /// explored level is `max_depth`, and nothing below it is collected. A
    /// page that fails to fetch (or is genuinely empty) contributes zero
    /// links for its branch rather than failing the walk.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] only for cache storage failures; network
    /// failures degrade per the cache's documented policy.
    #[instrument(skip(self, domain), fields(root = %root_url, max_depth))]
    pub async fn crawl(
        &self,
        domain: &TargetDomain,
        root_url: &str,
        max_depth: u32,
    ) -> Result<Vec<String>, CacheError> {
        let mut downloadable = Vec::new();
        let mut stack = vec![Step::Visit {
            url: root_url.to_string(),
            depth: 0,
        }];

        while let Some(step) = stack.pop() {
            match step {
                Step::Emit { url } => downloadable.push(url),
                Step::Visit { url, depth } => {
                    if depth > max_depth {
                        trace!(url = %url, depth, "depth bound reached, truncating");
                        continue;
                    }

                    let page = self.cache.fetch_page(&url).await?;
                    let html = String::from_utf8_lossy(&page.bytes);
                    let links = listing_links(&html);
                    debug!(url = %url, depth, links = links.len(), "visited listing");

                    // Reverse push so the LIFO stack replays the links in
                    // document order, sub-listings expanded in place.
                    for link in links.into_iter().rev() {
                        match link {
                            ListingLink::SubListing(href) => stack.push(Step::Visit {
                                url: domain.join(&href),
                                depth: depth + 1,
                            }),
                            ListingLink::Leaf(href) => stack.push(Step::Emit {
                                url: domain.join(&href),
                            }),
                        }
                    }
                }
            }
        }

        Ok(downloadable)
    }
}
