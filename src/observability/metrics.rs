//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_requests_total` (counter): requests by method, route, status
//! - `rpc_request_duration_seconds` (histogram): dispatch latency
//! - `rpc_client_calls_total` (counter): proxy calls by method, route, outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape listener. Needs a running Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "rpc_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "rpc_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one client proxy call. `outcome` is `ok` or the error kind.
pub fn record_client_call(method: &str, route: &str, outcome: &'static str) {
    counter!(
        "rpc_client_calls_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
