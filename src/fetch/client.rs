//! HTTP client wrapper for listing fetches and file transfers.
//!
//! One client serves both halves of a mirror run: whole-body GETs for
//! listing pages (consumed by the response cache) and streaming GETs for
//! file downloads (written straight to disk, never cached).

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::error::FetchError;
use crate::user_agent;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// HTTP client for listing fetches and streaming file transfers.
///
/// Designed to be created once and reused across a whole batch, taking
/// advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use h5mirror_core::fetch::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let html = client.get_bytes("http://host/files/").await?;
/// let written = client
///     .download_to_path("http://host/files/a.zip", Path::new("./files/a.zip"))
///     .await?;
/// println!("listing: {} bytes, file: {} bytes", html.len(), written);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches a URL and returns the whole response body.
    ///
    /// Used for listing pages, which are small HTML documents.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the URL is invalid, the request fails
    /// (network error, timeout), or the server returns an error status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self.send_get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        debug!(bytes = bytes.len(), "fetched listing body");
        Ok(bytes.to_vec())
    }

    /// Streams a URL's body to `path`, returning the number of bytes written.
    ///
    /// The parent directory must already exist. On any error the partial
    /// file is removed so an incomplete transfer never looks complete.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the URL is invalid, the request fails, the
    /// server returns an error status, or writing to disk fails.
    #[must_use = "transfer result reports bytes written"]
    #[instrument(skip(self), fields(url = %url, path = %path.display()))]
    pub async fn download_to_path(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self.send_get(url).await?;

        let file = File::create(path)
            .await
            .map_err(|e| FetchError::io(path.to_path_buf(), e))?;

        let stream_result = stream_to_file(file, response, url, path).await;

        if stream_result.is_err() {
            debug!(path = %path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(path).await;
        }

        let bytes_written = stream_result?;
        info!(path = %path.display(), bytes = bytes_written, "transfer complete");
        Ok(bytes_written)
    }

    async fn send_get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Streams a response body to file, returning bytes written.
///
/// Extracted so the caller can clean up the partial file on error.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(path.to_path_buf(), e))?;

    Ok(bytes_written)
}
