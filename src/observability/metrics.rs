//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by operation, outcome
//! - `gateway_upstream_duration_seconds` (histogram): upstream latency by operation, class
//! - `gateway_errors_total` (counter): error envelopes written, by kind
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder calls are no-ops
//! - Prometheus exporter only starts when enabled in configuration

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one finished request.
pub fn record_request(operation: &'static str, outcome: &'static str) {
    metrics::counter!("gateway_requests_total", "operation" => operation, "outcome" => outcome).increment(1);
}

/// Record upstream latency measured from `started`.
pub fn record_upstream(operation: &'static str, class: &'static str, started: Instant) {
    metrics::histogram!("gateway_upstream_duration_seconds", "operation" => operation, "class" => class)
        .record(started.elapsed().as_secs_f64());
}

/// Count one error envelope.
pub fn record_error(kind: &'static str) {
    metrics::counter!("gateway_errors_total", "kind" => kind).increment(1);
}
