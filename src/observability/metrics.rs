//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method and outcome
//! - `dispatch_duration_seconds` (histogram): time spent resolving and running handlers
//! - `dispatch_cache_total` (counter): cache lookups by cache and result
//! - `dispatch_pattern_scans_total` (counter): fallback scans over parameterized routes
//! - `dispatch_handler_failures_total` (counter): handler errors and panics
//! - `dispatch_routes` (gauge): routes in the active table
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is optional and only installed when enabled in config

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter, serving scrapes on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// `outcome` is `"handled"`, `"not_found"` or `"failed"`.
pub fn record_dispatch(method: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "dispatch_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// `cache` is `"routes"` or `"not_found"`.
pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("dispatch_cache_total", "cache" => cache, "result" => result).increment(1);
}

pub fn record_pattern_scan(matched: bool) {
    let result = if matched { "match" } else { "miss" };
    metrics::counter!("dispatch_pattern_scans_total", "result" => result).increment(1);
}

/// `kind` is `"error"`, `"panic"` or `"unresolved"`.
pub fn record_handler_failure(kind: &'static str) {
    metrics::counter!("dispatch_handler_failures_total", "kind" => kind).increment(1);
}

pub fn record_route_count(count: usize) {
    metrics::gauge!("dispatch_routes").set(count as f64);
}
