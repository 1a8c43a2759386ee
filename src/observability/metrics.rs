//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `scanner_cycles_total` (counter): completed scan cycles
//! - `scanner_cycle_duration_seconds` (histogram): time per cycle
//! - `scanner_cycle_overruns_total` (counter): ticks skipped by slow cycles
//! - `scanner_open_ports` (gauge): open ports in the latest cycle
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_scan_cycle(elapsed: Duration) {
    counter!("scanner_cycles_total").increment(1);
    histogram!("scanner_cycle_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_scan_overrun(skipped: u64) {
    counter!("scanner_cycle_overruns_total").increment(skipped);
}

pub fn record_open_ports(count: usize) {
    gauge!("scanner_open_ports").set(count as f64);
}
