//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by outcome and status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency by outcome
//! - `gateway_upstream_duration_seconds` (histogram): upstream round-trip latency

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished gateway request.
pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one upstream exchange.
pub fn record_upstream(status: Option<u16>, elapsed: Duration) {
    let status = status.map_or_else(|| "none".to_string(), |s| s.to_string());
    histogram!("gateway_upstream_duration_seconds", "status" => status)
        .record(elapsed.as_secs_f64());
}
