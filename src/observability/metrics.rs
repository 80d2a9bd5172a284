//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, upstream
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_denials_total` (counter): pipeline denials by reason
//! - `gateway_credits_consumed_total` (counter): debits by path (atomic/fallback)
//! - `gateway_profile_missing_total` (counter): verified accounts with no profile row
//! - `gateway_extension_installs_total` (counter): installer outcomes

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener. Failure to bind is
/// logged, not fatal; the gateway runs without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, upstream: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("upstream", upstream.to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a pipeline denial (unauthenticated, insufficient_credit, forbidden).
pub fn record_denial(reason: &'static str) {
    metrics::counter!("gateway_denials_total", "reason" => reason).increment(1);
}

/// Record a credit debit; `path` is "atomic" or "fallback".
pub fn record_credit_consumed(path: &'static str) {
    metrics::counter!("gateway_credits_consumed_total", "path" => path).increment(1);
}

/// Record a verified account that had no profile row and was defaulted.
pub fn record_profile_missing() {
    metrics::counter!("gateway_profile_missing_total").increment(1);
}

/// Record an extension install outcome ("installed" or "failed").
pub fn record_extension_install(outcome: &'static str) {
    metrics::counter!("gateway_extension_installs_total", "outcome" => outcome).increment(1);
}
