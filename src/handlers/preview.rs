//! Link preview endpoint
//!
//! `POST /api/link-preview` with a JSON body `{ "url": "https://..." }`.
//!
//! | Outcome                         | Status | Body                                    |
//! |---------------------------------|--------|-----------------------------------------|
//! | `url` missing, null or empty    | 400    | `{"error":"URL is required"}`           |
//! | `url` not an absolute URL       | 400    | `{"error":"Invalid URL"}`               |
//! | fetched, or upstream non-2xx    | 200    | `PreviewResult`                         |
//! | transport or parse fault        | 500    | `{"error":"Failed to fetch preview"}`   |

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{InvalidRequest, PreviewError};
use crate::preview::PreviewSource;
use crate::state::AppState;

/// Route path of the preview endpoint
pub const PREVIEW_PATH: &str = "/api/link-preview";

/// Request body of the preview endpoint
///
/// `url` is kept as a raw JSON value so a wrong type can be told apart from a
/// missing field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewRequest {
    /// Target URL
    #[serde(default)]
    pub url: Option<Value>,
}

impl PreviewRequest {
    /// Decode a request body. Anything that is not a JSON object counts as a
    /// request without a `url`.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The requested URL string.
    ///
    /// # Errors
    ///
    /// [`InvalidRequest::MissingUrl`] when `url` is absent, null, `false`,
    /// `0` or `""`; [`InvalidRequest::MalformedUrl`] for any other non-string.
    pub fn url(&self) -> Result<&str, InvalidRequest> {
        match &self.url {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Err(InvalidRequest::MissingUrl),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(InvalidRequest::MissingUrl),
            Some(Value::String(s)) if s.is_empty() => Err(InvalidRequest::MissingUrl),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(InvalidRequest::MalformedUrl),
        }
    }
}

/// `POST /api/link-preview`
#[instrument(skip_all)]
pub async fn preview_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let start = Instant::now();
    let request = PreviewRequest::from_body(&body);

    let outcome = match request.url() {
        Ok(url) => state.previewer().preview(url).await,
        Err(reason) => Err(PreviewError::InvalidRequest(reason)),
    };

    let response = match outcome {
        Ok(preview) => {
            match preview.source {
                PreviewSource::Document => state.record_preview(),
                PreviewSource::Degraded(_) => state.record_degraded(),
            };
            (StatusCode::OK, Json(preview.result)).into_response()
        }
        Err(err) => {
            match &err {
                PreviewError::InvalidRequest(reason) => {
                    debug!("Rejected preview request: {}", reason);
                    state.record_rejected();
                }
                PreviewError::Internal(_) => {
                    state.record_error();
                }
            }
            err.into_response()
        }
    };

    state.record_latency(start.elapsed());
    response
}

/// Routes for the preview endpoint.
pub fn preview_routes() -> Router<Arc<AppState>> {
    Router::new().route(PREVIEW_PATH, post(preview_handler))
}
