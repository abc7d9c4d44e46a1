//! Metrics collection and exposition.
//!
//! # Metrics
//! - `inspector_requests_total` (counter): requests by method, route, status
//! - `inspector_request_duration_seconds` (histogram): handling latency
//! - `inspector_request_body_bytes` (histogram): buffered body sizes
//! - `inspector_body_kind_total` (counter): classification outcome
//! - `inspector_captures_total` (counter): capture outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::capture::BodyKind;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let route = route.to_string();
    let status = status.to_string();

    counter!(
        "inspector_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "inspector_request_duration_seconds",
        "method" => method,
        "route" => route,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_body(kind: BodyKind, len: usize) {
    counter!("inspector_body_kind_total", "kind" => kind.as_str()).increment(1);
    histogram!("inspector_request_body_bytes").record(len as f64);
}

pub fn record_capture(outcome: &'static str) {
    counter!("inspector_captures_total", "outcome" => outcome).increment(1);
}
