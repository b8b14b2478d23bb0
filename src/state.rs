//! Shared application state
//!
//! One `AppState` is built at startup and shared behind an `Arc` for the life
//! of the process. It holds the previewer (and with it the pooled HTTP client)
//! plus the counters reported by `/status`.
//!
//! # Thread Safety
//!
//! - `start_time`: Immutable after creation
//! - counters: `AtomicU64` for lock-free increments
//! - `latency_histogram`: RwLock-wrapped for efficient reads

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::handlers::status::{LatencyHistogram, LatencyMetrics};
use crate::preview::LinkPreviewer;

/// Shared state handed to every handler
#[derive(Debug)]
pub struct AppState {
    previewer: LinkPreviewer,

    /// Server start time for uptime calculation
    start_time: Instant,

    /// Previews built from a fetched document
    previews_served: AtomicU64,

    /// Hostname-only previews after a non-success upstream status
    degraded_previews: AtomicU64,

    /// Requests rejected as invalid input
    rejected_requests: AtomicU64,

    /// Internal failures
    error_count: AtomicU64,

    /// Preview latency histogram for percentile calculations
    latency_histogram: LatencyHistogram,

    /// Total preview requests recorded
    total_requests: AtomicU64,
}

impl AppState {
    /// Create state around a configured previewer.
    pub fn new(previewer: LinkPreviewer) -> Self {
        Self {
            previewer,
            start_time: Instant::now(),
            previews_served: AtomicU64::new(0),
            degraded_previews: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            latency_histogram: LatencyHistogram::new(),
            total_requests: AtomicU64::new(0),
        }
    }

    /// The previewer used by the preview endpoint.
    #[inline]
    pub fn previewer(&self) -> &LinkPreviewer {
        &self.previewer
    }

    /// Get the server uptime in seconds.
    #[inline]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get the number of document-backed previews served.
    #[inline]
    pub fn previews_served(&self) -> u64 {
        self.previews_served.load(Ordering::Relaxed)
    }

    /// Count a document-backed preview and return the new total.
    #[inline]
    pub fn record_preview(&self) -> u64 {
        self.previews_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get the number of degraded previews served.
    #[inline]
    pub fn degraded_previews(&self) -> u64 {
        self.degraded_previews.load(Ordering::Relaxed)
    }

    /// Count a degraded preview and return the new total.
    #[inline]
    pub fn record_degraded(&self) -> u64 {
        self.degraded_previews.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get the number of rejected requests.
    #[inline]
    pub fn rejected_requests(&self) -> u64 {
        self.rejected_requests.load(Ordering::Relaxed)
    }

    /// Count a rejected request and return the new total.
    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record an internal failure.
    #[inline]
    pub fn record_error(&self) -> u64 {
        self.error_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get the total error count.
    #[inline]
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Record a request latency in microseconds.
    #[inline]
    pub fn record_latency_us(&self, latency_us: u64) {
        self.latency_histogram.record(latency_us);
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request latency duration.
    #[inline]
    pub fn record_latency(&self, duration: Duration) {
        self.latency_histogram.record_duration(duration);
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the latency metrics.
    #[inline]
    pub fn latency_metrics(&self) -> LatencyMetrics {
        self.latency_histogram.metrics()
    }

    /// Get the total number of requests recorded.
    #[inline]
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }
}
