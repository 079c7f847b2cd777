//! Metrics definitions for the API Gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gateway_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: ~10 values (gateway routes plus one per dependency prefix)
//! - `status`: 3 values (success, error, timeout)
//! - `outcome`: 5 values (authenticated plus the four rejection reasons)
//! - `dependency`: bounded by the route table, unknown names become "unknown"

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Gateway-local request buckets (auth + routing overhead included)
        .set_buckets_for_metric(
            Matcher::Prefix("gateway_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Downstream buckets reach the configured timeout ceiling
        .set_buckets_for_metric(
            Matcher::Prefix("gateway_downstream_request".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set downstream request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `gateway_http_requests_total`, `gateway_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures ALL responses, including 401s from the auth gate and
/// framework-level 404/405s.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("gateway_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gateway_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/" => "/".to_string(),
        "/health" => "/health".to_string(),
        "/ready" => "/ready".to_string(),
        "/metrics" => "/metrics".to_string(),
        "/auth/test" => "/auth/test".to_string(),
        "/api/v1/me" => "/api/v1/me".to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

/// Normalize paths with dynamic segments
///
/// Collapses everything under a dependency prefix to `<prefix>/*`.
fn normalize_dynamic_endpoint(path: &str) -> String {
    if path.starts_with("/fallback/") {
        return "/fallback/{dependency}".to_string();
    }

    for prefix in ["/api/auth", "/api/users"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            if rest.is_empty() || rest.starts_with('/') {
                return format!("{prefix}/*");
            }
        }
    }

    // Unknown paths normalized to "/other" to bound cardinality
    "/other".to_string()
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record one authentication gate evaluation.
///
/// Metric: `gateway_auth_results_total`
/// Labels: `outcome` ("authenticated", "missing", "malformed", "expired",
/// "invalid-signature")
pub fn record_auth_result(outcome: &str) {
    counter!("gateway_auth_results_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Downstream Metrics
// ============================================================================

/// Record a forwarded request.
///
/// Metric: `gateway_downstream_requests_total`,
/// `gateway_downstream_request_duration_seconds`
/// Labels: `dependency`, `status` ("success", "error", "unavailable")
pub fn record_downstream_request(dependency: &str, status: &str, duration: Duration) {
    histogram!("gateway_downstream_request_duration_seconds",
        "dependency" => dependency.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gateway_downstream_requests_total",
        "dependency" => dependency.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a degraded (fallback) response.
///
/// Metric: `gateway_fallback_responses_total`
/// Labels: `dependency`
pub fn record_fallback_response(dependency: &str) {
    counter!("gateway_fallback_responses_total",
        "dependency" => dependency.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================
