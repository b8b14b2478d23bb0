//! Page metadata extraction
//!
//! This module parses a fetched HTML document and pulls out the handful of
//! values a preview card needs: the document title, the description meta tag,
//! and the Open Graph title/description/image/site name.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Extracted page metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Text of the document `<title>`
    pub title: Option<String>,
    /// `description` meta tag
    pub description: Option<String>,
    /// Open Graph metadata
    pub open_graph: OpenGraphData,
}

/// Open Graph metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenGraphData {
    /// og:title
    pub title: Option<String>,
    /// og:description
    pub description: Option<String>,
    /// og:image
    pub image: Option<String>,
    /// og:site_name
    pub site_name: Option<String>,
}

/// Metadata extraction functionality
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Parse `html` and extract all preview-relevant metadata.
    #[instrument(skip(html), fields(html_len = html.len()))]
    pub fn extract(html: &str) -> PageMetadata {
        let document = Html::parse_document(html);

        let metadata = PageMetadata {
            title: title_text(&document),
            description: meta_tag(&document, "description"),
            open_graph: OpenGraphData {
                title: meta_tag(&document, "og:title"),
                description: meta_tag(&document, "og:description"),
                image: meta_tag(&document, "og:image"),
                site_name: meta_tag(&document, "og:site_name"),
            },
        };

        debug!(
            "Extracted metadata: title={:?}, og_title={:?}, site_name={:?}",
            metadata.title, metadata.open_graph.title, metadata.open_graph.site_name
        );

        metadata
    }

    /// Get the best title from available sources
    pub fn best_title(metadata: &PageMetadata) -> Option<String> {
        metadata
            .open_graph
            .title
            .clone()
            .or_else(|| metadata.title.clone())
    }

    /// Get the best description from available sources
    pub fn best_description(metadata: &PageMetadata) -> Option<String> {
        metadata
            .open_graph
            .description
            .clone()
            .or_else(|| metadata.description.clone())
    }

    /// Get the best image from available sources
    pub fn best_image(metadata: &PageMetadata) -> Option<String> {
        metadata.open_graph.image.clone()
    }
}

/// Look up a meta tag by key: `meta[property=key]` first, then `meta[name=key]`.
///
/// Only the first element matching each selector is consulted. An empty or
/// whitespace-only `content` counts as absent.
pub fn meta_tag(document: &Html, key: &str) -> Option<String> {
    meta_content(document, "property", key).or_else(|| meta_content(document, "name", key))
}

fn meta_content(document: &Html, attribute: &str, key: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[{attribute}="{key}"]"#)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .and_then(non_empty)
}

fn title_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| non_empty(&el.text().collect::<String>()))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
