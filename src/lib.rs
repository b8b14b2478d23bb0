//! linkcard-web - Link Preview Service
//!
//! Fetches a URL and extracts Open Graph / HTML meta tags into a small,
//! display-ready preview card: title, description, image and site label.
//!
//! # Architecture
//!
//! ```text
//! Site page ──POST /api/link-preview──▶ Router ──▶ LinkPreviewer
//!                                                     │
//!                                         ┌───────────┴───────────┐
//!                                         ▼                       ▼
//!                                    PageFetcher          MetadataExtractor
//!                                   (one GET, capped)     (og:, <title>, meta)
//!                                         │                       │
//!                                         └───────────┬───────────┘
//!                                                     ▼
//!                                               PreviewResult
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use linkcard_web::config::FetchConfig;
//! use linkcard_web::preview::LinkPreviewer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let previewer = LinkPreviewer::new(FetchConfig::default())?;
//!     let card = previewer.extract("https://example.com").await?;
//!
//!     println!("{} ({})", card.title, card.domain);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod cors;
pub mod error;
pub mod extraction;
pub mod handlers;
pub mod preview;
pub mod server;
pub mod state;

// Re-exports for convenience
pub use config::{FetchConfig, ServerConfig};
pub use error::{Error, PreviewError, Result};
pub use extraction::MetadataExtractor;
pub use preview::{LinkPreviewer, PreviewResult};
pub use state::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
