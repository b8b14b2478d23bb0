//! CORS configuration
//!
//! The preview endpoint is called from the site's own pages, so the policy
//! admits the configured site origins plus localhost on any port for local
//! development. Everything else is rejected.
//!
//! - **Allowed Methods**: GET, POST, OPTIONS (preflight)
//! - **Allowed Headers**: Content-Type
//! - **Max Age**: 3600 seconds (1 hour) for preflight caching

use std::sync::Arc;
use std::time::Duration;

use http::{header::HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;

/// Allowed request headers
pub const ALLOWED_HEADERS: [http::header::HeaderName; 1] = [http::header::CONTENT_TYPE];

/// Allowed methods
pub const ALLOWED_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

/// Default max age for preflight cache (1 hour)
pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;

/// Build the CORS layer for the given site origins.
///
/// Origins are compared case-insensitively and exactly, so
/// `https://example.com` does not admit `https://example.com.evil.net`.
pub fn cors_layer(site_origins: &[String]) -> CorsLayer {
    let site_origins: Arc<Vec<String>> = Arc::new(
        site_origins
            .iter()
            .map(|origin| origin.to_ascii_lowercase())
            .collect(),
    );

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let result = validate_origin(origin, &site_origins);
            if !result.allowed {
                debug!("CORS rejected {}: {}", result.origin, result.reason);
            }
            result.allowed
        }))
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS)
        .max_age(Duration::from_secs(DEFAULT_MAX_AGE_SECS))
}

/// Result of an origin check, with the reason for logging.
#[derive(Debug, Clone)]
pub struct CorsValidationResult {
    /// Whether the origin is allowed
    pub allowed: bool,
    /// The origin that was checked
    pub origin: String,
    /// Reason for the decision
    pub reason: &'static str,
}

/// Check an Origin header against localhost and the site origins.
///
/// `site_origins` must already be lowercase.
pub fn validate_origin(origin: &HeaderValue, site_origins: &[String]) -> CorsValidationResult {
    let origin_str = match origin.to_str() {
        Ok(s) => s,
        Err(_) => {
            return CorsValidationResult {
                allowed: false,
                origin: String::from_utf8_lossy(origin.as_bytes()).into_owned(),
                reason: "Invalid header value format",
            }
        }
    };

    let (allowed, reason) = if is_localhost_origin(origin) {
        (true, "Localhost origin allowed")
    } else if site_origins.contains(&origin_str.to_ascii_lowercase()) {
        (true, "Configured site origin")
    } else {
        (false, "Origin not in allowed list")
    };

    CorsValidationResult {
        allowed,
        origin: origin_str.to_string(),
        reason,
    }
}

/// Checks if the given origin is a localhost origin.
///
/// Accepts `http(s)://localhost`, `http(s)://127.0.0.1` and `http(s)://[::1]`,
/// each with an optional port. Lookalikes such as `http://localhost.evil.com`
/// are rejected.
pub fn is_localhost_origin(origin: &HeaderValue) -> bool {
    let origin_lower = match origin.to_str() {
        Ok(s) => s.to_lowercase(),
        Err(_) => return false,
    };

    let Some(rest) = origin_lower
        .strip_prefix("http://")
        .or_else(|| origin_lower.strip_prefix("https://"))
    else {
        return false;
    };

    for host in ["localhost", "127.0.0.1", "[::1]"] {
        if let Some(after_host) = rest.strip_prefix(host) {
            return valid_port_suffix(after_host);
        }
    }

    false
}

/// Accepts "", ":PORT" or ":PORT/..." or "/...".
fn valid_port_suffix(after_host: &str) -> bool {
    if after_host.is_empty() || after_host.starts_with('/') {
        return true;
    }

    match after_host.strip_prefix(':') {
        Some(port_str) => {
            let port_end = port_str.find('/').unwrap_or(port_str.len());
            matches!(port_str[..port_end].parse::<u16>(), Ok(port) if port > 0)
        }
        None => false,
    }
}
