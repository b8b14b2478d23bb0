//! Link preview construction
//!
//! Validates a target URL, fetches it once, and composes a [`PreviewResult`]
//! from the page's metadata with a fixed fallback chain:
//!
//! ```text
//! title       <- og:title -> <title> -> display domain
//! description <- og:description -> description -> ""
//! image       <- og:image -> ""
//! domain      <- og:site_name -> hostname without leading "www."
//! ```
//!
//! A target that answers with a non-success status still produces a preview,
//! built from the hostname alone. Transport and parse faults do not.

pub mod fetch;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::error::{FetchError, InvalidRequest, PreviewError};
use crate::extraction::{MetadataExtractor, PageMetadata};

pub use fetch::{FetchOutcome, FetchedPage, PageFetcher};

/// Display-ready summary of a linked page
///
/// Every field is always a string; absent values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResult {
    /// Best-effort human title
    pub title: String,
    /// Best-effort summary text
    pub description: String,
    /// URL of a representative image, as written in the page
    pub image: String,
    /// Site name, or the hostname without a leading "www."
    pub domain: String,
}

impl PreviewResult {
    /// Placeholder built from the hostname alone, used when the target
    /// answers with a non-success status. The hostname is not stripped.
    pub fn degraded(hostname: &str) -> Self {
        Self {
            title: hostname.to_string(),
            description: String::new(),
            image: String::new(),
            domain: hostname.to_string(),
        }
    }

    /// Compose a preview from parsed page metadata.
    pub fn from_metadata(metadata: &PageMetadata, hostname: &str) -> Self {
        let domain = metadata
            .open_graph
            .site_name
            .clone()
            .unwrap_or_else(|| display_domain(hostname).to_string());

        Self {
            title: MetadataExtractor::best_title(metadata).unwrap_or_else(|| domain.clone()),
            description: MetadataExtractor::best_description(metadata).unwrap_or_default(),
            image: MetadataExtractor::best_image(metadata).unwrap_or_default(),
            domain,
        }
    }
}

/// Where a preview's data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSource {
    /// Parsed from a successfully fetched document
    Document,
    /// Hostname-only placeholder; carries the upstream status
    Degraded(u16),
}

/// A preview together with how it was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// The result returned to callers
    pub result: PreviewResult,
    /// Provenance, used for stats and logging
    pub source: PreviewSource,
}

/// Strip one leading `"www."` from a hostname.
pub fn display_domain(hostname: &str) -> &str {
    hostname.strip_prefix("www.").unwrap_or(hostname)
}

/// Validate a caller-supplied URL string.
///
/// # Errors
///
/// [`InvalidRequest::MissingUrl`] for an empty string,
/// [`InvalidRequest::MalformedUrl`] if it does not parse as an absolute URL.
pub fn validate_url(raw: &str) -> Result<Url, InvalidRequest> {
    if raw.is_empty() {
        return Err(InvalidRequest::MissingUrl);
    }
    Url::parse(raw).map_err(|_| InvalidRequest::MalformedUrl)
}

/// Builds link previews
#[derive(Debug, Clone)]
pub struct LinkPreviewer {
    fetcher: PageFetcher,
}

impl LinkPreviewer {
    /// Create a previewer with its own HTTP client.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: PageFetcher::new(config)?,
        })
    }

    /// Create a previewer around an existing fetcher.
    pub fn with_fetcher(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    /// The underlying fetcher.
    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    /// Build the preview for `url`.
    pub async fn extract(&self, url: &str) -> Result<PreviewResult, PreviewError> {
        self.preview(url).await.map(|preview| preview.result)
    }

    /// Build the preview for `url`, also reporting whether it was degraded.
    ///
    /// # Errors
    ///
    /// - [`PreviewError::InvalidRequest`] before any network I/O if `url` is
    ///   empty or malformed.
    /// - [`PreviewError::Internal`] if the fetch fails below the HTTP level
    ///   (connection, TLS, timeout, body read).
    #[instrument(skip(self), fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn preview(&self, url: &str) -> Result<Preview, PreviewError> {
        let target = validate_url(url)?;

        // Always the requested host, never the post-redirect one
        let hostname = target.host_str().unwrap_or_default().to_string();

        let outcome = match self.fetcher.fetch(&target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to fetch preview for {}: {}", url, e);
                return Err(PreviewError::Internal(e));
            }
        };

        match outcome {
            FetchOutcome::Unsuccessful(status) => {
                warn!(
                    "Upstream {} answered {}, returning hostname-only preview",
                    hostname, status
                );
                Ok(Preview {
                    result: PreviewResult::degraded(&hostname),
                    source: PreviewSource::Degraded(status.as_u16()),
                })
            }
            FetchOutcome::Document(page) => {
                let metadata = MetadataExtractor::extract(&page.body);
                let result = PreviewResult::from_metadata(&metadata, &hostname);
                info!(
                    "Built preview for {} in {}ms (final url: {})",
                    hostname, page.duration_ms, page.final_url
                );
                Ok(Preview {
                    result,
                    source: PreviewSource::Document,
                })
            }
        }
    }
}
