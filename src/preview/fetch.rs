//! Outbound page fetching
//!
//! One GET per preview. The client is built once and shared, so connection
//! pooling carries across requests; nothing else does.

use std::time::Instant;

use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// A document that came back with a success status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after any redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Body decoded as UTF-8 (lossy), capped at the configured size
    pub body: String,
    /// Whether the body was cut at the cap
    pub truncated: bool,
    /// Fetch duration in milliseconds
    pub duration_ms: u64,
}

/// Result of a fetch that completed at the HTTP level
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx response with its body
    Document(FetchedPage),
    /// Any other final status; the body is not read
    Unsuccessful(StatusCode),
}

/// HTTP client wrapper for fetching preview targets
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    config: FetchConfig,
}

impl PageFetcher {
    /// Build a fetcher with the given settings.
    ///
    /// Redirects follow reqwest's default policy.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// The settings this fetcher was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GET `url` and read at most `max_body_bytes` of the body.
    ///
    /// # Errors
    ///
    /// Transport-level failures, including timeout expiry, are returned as
    /// [`FetchError`]. A non-success status is not an error.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<FetchOutcome, FetchError> {
        let start = Instant::now();
        let timeout_ms = self.config.timeout_ms;

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            debug!("Upstream answered {}", status);
            return Ok(FetchOutcome::Unsuccessful(status));
        }

        let final_url = response.url().to_string();
        let cap = self.config.max_body_bytes;
        let mut bytes: Vec<u8> = Vec::new();
        let mut truncated = false;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout_ms))?
        {
            let room = cap - bytes.len();
            if chunk.len() > room {
                bytes.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Fetched {} bytes in {}ms (truncated: {})",
            bytes.len(),
            duration_ms,
            truncated
        );

        Ok(FetchOutcome::Document(FetchedPage {
            final_url,
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
            truncated,
            duration_ms,
        }))
    }
}
