//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mirror_requests_total` (counter): requests by method, route, status
//! - `mirror_request_duration_seconds` (histogram): latency by route
//! - `mirror_upstream_fetches_total` (counter): origin fetches by outcome
//! - `mirror_upstream_fetch_duration_seconds` (histogram): origin latency
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished inbound request.
pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    counter!(
        "mirror_requests_total",
        "method" => method.to_string(),
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("mirror_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record one origin fetch.
pub fn record_upstream_fetch(outcome: &'static str, start: Instant) {
    counter!("mirror_upstream_fetches_total", "outcome" => outcome).increment(1);
    histogram!("mirror_upstream_fetch_duration_seconds").record(start.elapsed().as_secs_f64());
}
