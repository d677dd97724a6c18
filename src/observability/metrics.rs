//! Metrics collection and exposition.
//!
//! # Metrics
//! - `phonegen_requests_total` (counter): requests by method, status
//! - `phonegen_request_duration_seconds` (histogram): latency by method
//! - `phonegen_rate_limited_total` (counter): admissions denied by quota
//! - `phonegen_auth_failures_total` (counter): rejected credentials
//! - `phonegen_numbers_generated_total` (counter): numbers by format
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::generator::PhoneFormat;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    counter!(
        "phonegen_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("phonegen_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("phonegen_rate_limited_total").increment(1);
}

pub fn record_auth_failure() {
    counter!("phonegen_auth_failures_total").increment(1);
}

pub fn record_generated(format: PhoneFormat, count: usize) {
    counter!("phonegen_numbers_generated_total", "format" => format.as_str())
        .increment(count as u64);
}
