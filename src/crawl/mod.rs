//! Recursive listing crawler.
//!
//! Turns a crawl-root URL into the flat, order-preserving set of
//! downloadable file URLs by walking directory-listing pages through the
//! response cache, bounded by a maximum recursion depth.

mod crawler;
mod domain;
mod listing;

pub use crawler::ListingCrawler;
pub use domain::{InvalidRootUrl, TargetDomain};
pub use listing::{ListingLink, listing_links};
