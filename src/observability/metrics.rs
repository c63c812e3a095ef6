//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency by method, status, route
//! - `gateway_auth_rejections_total` (counter): credential rejections by reason
//! - `gateway_preflight_requests_total` (counter): short-circuited OPTIONS requests
//!
//! # Design Decisions
//! - Route label is the route id, never the raw path, to keep
//!   cardinality bounded
//! - Exposition failure is logged and non-fatal; the gateway serves
//!   traffic without metrics rather than refusing to start

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus exposition endpoint.
pub fn init_metrics(address: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(address).install() {
        Ok(()) => {
            tracing::info!(address = %address, "Metrics endpoint started");
        }
        Err(error) => {
            tracing::error!(error = %error, "Failed to start metrics endpoint");
        }
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, route: &str, start_time: Instant) {
    let duration = start_time.elapsed().as_secs_f64();
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(duration);
}

/// Record a rejected credential. `reason` is the stable rejection label.
pub fn record_auth_rejection(reason: &'static str) {
    counter!("gateway_auth_rejections_total", "reason" => reason).increment(1);
}

/// Record a preflight request answered without touching an upstream.
pub fn record_preflight() {
    counter!("gateway_preflight_requests_total").increment(1);
}
