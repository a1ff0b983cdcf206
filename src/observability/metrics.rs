//! Metrics collection and exposition.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hostgate_requests_total` | Counter | `host` | Requests dispatched, by matched chain |
//! | `hostgate_forced_cancellations_total` | Counter | - | Drains that force-cancelled requests |
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! exporter.

use std::net::SocketAddr;

use metrics::describe_counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    register_metric_descriptions();
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!(
        "hostgate_requests_total",
        "Requests dispatched, labelled by the matched host chain"
    );
    describe_counter!(
        "hostgate_forced_cancellations_total",
        "Shutdowns that force-cancelled in-flight requests"
    );
}
