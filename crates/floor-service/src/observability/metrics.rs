//! Metrics definitions for the floor service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `floor_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! - `command`: bounded by the `Command` enum (20 values)
//! - `status`: `success` or an error code (15 values)
//! - `event`: bounded by the `FloorEvent` enum (10 values)
//! - `endpoint`: matched route templates, never raw paths

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used by `/metrics`.
///
/// Command latency buckets are tight because commands apply in memory.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("floor_command".to_string()),
            &[
                0.0001, 0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250,
            ],
        )
        .map_err(|e| format!("Failed to set command latency buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("floor_http".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP latency buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Record an HTTP request.
///
/// Metrics: `floor_http_requests_total`, `floor_http_request_duration_seconds`
/// Labels: `method`, `endpoint` (matched route template), `status_code`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    histogram!("floor_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("floor_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Record a processed command.
///
/// Metrics: `floor_commands_total`, `floor_command_duration_seconds`
/// Labels: `command`, `status`
pub fn record_command(command: &'static str, status: &'static str, duration: Duration) {
    counter!("floor_commands_total", "command" => command, "status" => status).increment(1);
    histogram!("floor_command_duration_seconds", "command" => command)
        .record(duration.as_secs_f64());
}

/// Record an event handed to the broadcast channel.
///
/// Metric: `floor_events_published_total`
/// Labels: `event`
pub fn record_event_published(event: &'static str) {
    counter!("floor_events_published_total", "event" => event).increment(1);
}

/// Set the number of connected observers.
///
/// Metric: `floor_observers_active`
pub fn set_observers_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("floor_observers_active").set(count as f64);
}

/// Set the floor actor's mailbox depth.
///
/// Metric: `floor_actor_mailbox_depth`
pub fn set_actor_mailbox_depth(depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("floor_actor_mailbox_depth").set(depth as f64);
}

/// Record a subscriber that fell behind and was told to resync.
///
/// Metric: `floor_observer_lagged_total`
pub fn record_observer_lagged(skipped: u64) {
    counter!("floor_observer_lagged_total").increment(1);
    counter!("floor_observer_skipped_events_total").increment(skipped);
}

/// Record pending queue items expired by the idle timeout.
///
/// Metric: `floor_pending_expired_total`
pub fn record_pending_expired(count: usize) {
    counter!("floor_pending_expired_total").increment(count as u64);
}
