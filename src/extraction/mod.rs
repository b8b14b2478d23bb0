//! Content extraction module
//!
//! Turns a fetched HTML document into the metadata a preview card is built
//! from.

pub mod metadata;

pub use metadata::{meta_tag, MetadataExtractor, OpenGraphData, PageMetadata};
