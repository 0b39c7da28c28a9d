//! HTTP transport: listing fetches and streaming file transfers.
//!
//! The rest of the crate treats "fetch a URL's bytes" as an injected
//! capability via the [`Fetcher`] trait; [`HttpClient`] is the production
//! implementation. File transfers go through [`HttpClient::download_to_path`]
//! directly and never pass through the response cache.

mod client;
mod error;

use async_trait::async_trait;

pub use client::{CONNECT_TIMEOUT_SECS, HttpClient, READ_TIMEOUT_SECS};
pub use error::FetchError;

/// Capability to fetch a URL's bytes over the network.
///
/// The response cache depends on this boundary instead of a concrete client
/// so tests can count or fake network calls.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs a network GET and returns the whole body.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get_bytes(url).await
    }
}
