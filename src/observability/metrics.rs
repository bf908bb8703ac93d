//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_session_requests_total` (counter): session requests by
//!   `kind` (query, signing) and `outcome` (hit, joined, built, failed)
//! - `ledger_session_cache_entries` (gauge): cached signing sessions
//!
//! Nothing is exported until [`init_metrics`] installs the Prometheus
//! recorder; before that every update is discarded.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const SESSION_REQUESTS_TOTAL: &str = "ledger_session_requests_total";
pub const SESSION_CACHE_ENTRIES: &str = "ledger_session_cache_entries";

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_session_request(kind: &'static str, outcome: &'static str) {
    metrics::counter!(SESSION_REQUESTS_TOTAL, "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_cache_entries(entries: usize) {
    metrics::gauge!(SESSION_CACHE_ENTRIES).set(entries as f64);
}
