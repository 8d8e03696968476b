//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the print desk server:
//! - HTTP request metrics (latency, counts, errors)
//! - Authentication and access-denied counters
//! - Print request lifecycle counters
//! - Request counts by status (collected on scrape)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use printdesk_core::request::RequestFilter;
use printdesk_core::RequestStatus;
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "printdesk_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .expect("valid histogram definition")
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("printdesk_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("valid counter definition")
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "printdesk_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .expect("valid gauge definition")
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "printdesk_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .expect("valid counter definition")
});

/// Authenticated callers refused by the access policy.
pub static ACCESS_DENIED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "printdesk_access_denied_total",
        "Total operations refused by the access policy",
    )
    .expect("valid counter definition")
});

// =============================================================================
// Print Request Metrics
// =============================================================================

/// Print requests by current status (collected dynamically).
pub static REQUESTS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "printdesk_requests_by_status",
            "Current print request count by status",
        ),
        &["status"],
    )
    .expect("valid gauge definition")
});

/// Print requests submitted.
pub static REQUESTS_SUBMITTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "printdesk_requests_submitted_total",
        "Total print requests submitted since startup",
    )
    .expect("valid counter definition")
});

/// Print requests edited by their owner.
pub static REQUESTS_EDITED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "printdesk_requests_edited_total",
        "Total print request edits since startup",
    )
    .expect("valid counter definition")
});

/// Status transitions performed from the admin panel.
pub static REQUEST_STATUS_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "printdesk_request_status_transitions_total",
            "Print request status transitions",
        ),
        &["from_status", "to_status"],
    )
    .expect("valid counter definition")
});

/// Print requests deleted.
pub static REQUESTS_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "printdesk_requests_deleted_total",
        "Total print requests deleted since startup",
    )
    .expect("valid counter definition")
});

/// Attached files accepted.
pub static FILES_UPLOADED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "printdesk_files_uploaded_total",
        "Total files attached to print requests",
    )
    .expect("valid counter definition")
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(AUTH_FAILURES_TOTAL.clone()),
        Box::new(ACCESS_DENIED_TOTAL.clone()),
        // Print requests
        Box::new(REQUESTS_BY_STATUS.clone()),
        Box::new(REQUESTS_SUBMITTED_TOTAL.clone()),
        Box::new(REQUESTS_EDITED_TOTAL.clone()),
        Box::new(REQUEST_STATUS_TRANSITIONS.clone()),
        Box::new(REQUESTS_DELETED_TOTAL.clone()),
        Box::new(FILES_UPLOADED_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::error!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the status gauges reflect the database.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let store = state.request_store();
    for status in RequestStatus::ALL {
        let filter = RequestFilter::new().with_status(status);
        match store.count(&filter) {
            Ok(count) => REQUESTS_BY_STATUS
                .with_label_values(&[status.as_str()])
                .set(count),
            Err(e) => tracing::warn!(status = %status, "Failed to count print requests: {}", e),
        }
    }
}

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("valid uuid pattern")
});

static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+(/|$)").expect("valid numeric segment pattern"));

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_RE.replace_all(path, "{id}");
    let result = NUMERIC_RE.replace_all(&result, "/{id}$1");
    result.to_string()
}
