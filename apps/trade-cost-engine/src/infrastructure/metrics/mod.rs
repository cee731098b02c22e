//! Prometheus Metrics Module
//!
//! Exposes engine metrics via Prometheus text format, rendered by the
//! stream server's `/metrics` route.
//!
//! # Metrics Categories
//!
//! - **Frames**: decoded, dropped, and overwritten-before-read counts
//! - **Connections**: live feed state and reconnect attempts
//! - **Computation**: pipeline runs and rejected ticks

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Installs once; later calls return the existing handle.
///
/// # Panics
///
/// Panics if the recorder cannot be installed (another recorder was
/// registered outside this module).
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .unwrap_or_else(|e| panic!("failed to install Prometheus recorder: {e}"));
            register_metrics();
            handle
        })
        .clone()
}

/// The Prometheus handle for rendering metrics, if initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

fn register_metrics() {
    describe_counter!(
        "cost_engine_frames_received_total",
        "Order-book frames decoded from the feed"
    );
    describe_counter!(
        "cost_engine_frames_dropped_total",
        "Undecodable frames dropped without closing the connection"
    );
    describe_counter!(
        "cost_engine_ticks_overwritten_total",
        "Ticks overwritten in the latest-tick slot before being read"
    );
    describe_counter!(
        "cost_engine_reconnects_total",
        "Feed reconnection attempts"
    );
    describe_counter!(
        "cost_engine_computes_total",
        "Successful cost-pipeline computations"
    );
    describe_counter!(
        "cost_engine_compute_errors_total",
        "Ticks rejected by the cost pipeline"
    );
    describe_gauge!(
        "cost_engine_feed_connected",
        "1 when the symbol's feed connection is live"
    );
}

/// Record one decoded frame.
pub fn record_frame_received(symbol: &str) {
    counter!("cost_engine_frames_received_total", "symbol" => symbol.to_string()).increment(1);
}

/// Record one dropped (undecodable) frame.
pub fn record_frame_dropped(symbol: &str) {
    counter!("cost_engine_frames_dropped_total", "symbol" => symbol.to_string()).increment(1);
}

/// Record a slot overwrite of an unread tick.
pub fn record_tick_overwritten(symbol: &str) {
    counter!("cost_engine_ticks_overwritten_total", "symbol" => symbol.to_string()).increment(1);
}

/// Record a reconnection attempt.
pub fn record_reconnect(symbol: &str) {
    counter!("cost_engine_reconnects_total", "symbol" => symbol.to_string()).increment(1);
}

/// Record one successful pipeline computation.
pub fn record_compute(symbol: &str) {
    counter!("cost_engine_computes_total", "symbol" => symbol.to_string()).increment(1);
}

/// Record one rejected tick.
pub fn record_compute_error(symbol: &str) {
    counter!("cost_engine_compute_errors_total", "symbol" => symbol.to_string()).increment(1);
}

/// Flag a symbol's feed as connected or not.
pub fn set_feed_connected(symbol: &str, connected: bool) {
    gauge!("cost_engine_feed_connected", "symbol" => symbol.to_string())
        .set(if connected { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_returns_the_same_handle() {
        let first = init_metrics();
        let _second = init_metrics();
        record_frame_received("BTC-USDT-SWAP");
        record_compute("BTC-USDT-SWAP");
        let rendered = first.render();
        assert!(rendered.contains("cost_engine_frames_received_total"));
    }
}
