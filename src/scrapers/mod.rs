//! Homepage indexing and article extraction.
//!
//! Every source goes through the same two-phase pattern:
//!
//! 1. **Indexing** ([`links`]): fetch the homepage and keep links that look
//!    like articles on the same host
//! 2. **Fetching** ([`article`]): download each link in order, extract a
//!    title, snippet and publish date ([`dates`]), stop at the per-source cap
//!
//! Network access goes through the [`PageFetcher`] trait so the pipeline can
//! be driven from in-memory pages in tests. [`HttpFetcher`] is the real
//! implementation.

pub mod article;
pub mod dates;
pub mod links;

use crate::error::FetchError;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Retrieves a page body as text.
pub trait PageFetcher {
    /// Fetch `url` and return its body.
    ///
    /// Implementations must bound the call with a timeout.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client with a fixed user
/// agent and a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Page fetch returned non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}
