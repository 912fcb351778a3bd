//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nextproto_connections_total` (counter): dispatched connections by route
//!   (`default`, `bound`, `unhandled`)
//! - `nextproto_handshake_failures_total` (counter): handshakes that failed or timed out
//! - `nextproto_active_connections` (gauge): current connection count
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless `init_metrics` runs.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve scrapes on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count a connection routed by the dispatcher.
pub fn record_connection(route: &'static str) {
    metrics::counter!("nextproto_connections_total", "route" => route).increment(1);
}

pub fn record_handshake_failure() {
    metrics::counter!("nextproto_handshake_failures_total").increment(1);
}

pub fn record_active_connections(active: u64) {
    metrics::gauge!("nextproto_active_connections").set(active as f64);
}
