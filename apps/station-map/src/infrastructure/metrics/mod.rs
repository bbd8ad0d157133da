//! Prometheus Metrics Module
//!
//! Exposes renderer metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Updates**: station updates received, applied and skipped
//! - **Input**: lines that could not be decoded
//! - **Latency**: time to apply one update
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Until
//! [`init_metrics`] is called the recording functions are no-ops.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::application::services::SkipReason;
use crate::domain::network::Station;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "station_map_updates_received_total",
        "Total station updates handed to the dispatcher"
    );
    describe_counter!(
        "station_map_updates_applied_total",
        "Total marker class writes by station"
    );
    describe_counter!(
        "station_map_updates_skipped_total",
        "Total station updates that left the map untouched, by reason"
    );
    describe_counter!(
        "station_map_decode_errors_total",
        "Total input lines that could not be decoded, by kind"
    );
    describe_counter!(
        "station_map_commit_failures_total",
        "Total failures to persist the rendered map"
    );
    describe_histogram!(
        "station_map_apply_seconds",
        "Time to resolve, compose and write one station update"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record an update handed to the dispatcher.
pub fn record_update_received() {
    counter!("station_map_updates_received_total").increment(1);
}

/// Record a marker class write.
pub fn record_update_applied(station: Station) {
    counter!(
        "station_map_updates_applied_total",
        "station" => station.code()
    )
    .increment(1);
}

/// Record an update that left the map untouched.
pub fn record_update_skipped(reason: SkipReason) {
    counter!(
        "station_map_updates_skipped_total",
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Record an input line that could not be decoded.
pub fn record_decode_error(kind: &'static str) {
    counter!("station_map_decode_errors_total", "kind" => kind).increment(1);
}

/// Record a failure to persist the rendered map.
pub fn record_commit_failure() {
    counter!("station_map_commit_failures_total").increment(1);
}

/// Record the time taken to apply one update.
pub fn record_apply_duration(duration: Duration) {
    histogram!("station_map_apply_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
