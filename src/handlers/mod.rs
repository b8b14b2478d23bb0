//! HTTP handlers
//!
//! - [`preview`]: the link preview endpoint
//! - [`status`]: health, readiness and status probes

pub mod preview;
pub mod status;

pub use preview::{preview_handler, preview_routes, PreviewRequest, PREVIEW_PATH};
pub use status::{
    health_handler, readiness_handler, status_handler, status_routes, HealthResponse,
    StatusResponse,
};
