//! Prometheus metrics exposition
//!
//! Service metrics:
//!
//! - `publish_requests_total` (counter): label `outcome`
//! - `publish_duration_seconds` (histogram): label `outcome`
//!
//! The pool crate adds `telegraph_flood_waits_total`,
//! `telegraph_account_rotations_total` and `telegraph_overflows_total` through
//! the same global recorder.

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Publishes can sit behind flood waits of up to a minute per attempt.
const DURATION_BUCKETS: &[f64] = &[
    0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("publish_duration_seconds".to_string()),
        DURATION_BUCKETS,
    )
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// `publish_duration_seconds` gets explicit buckets so it renders as a
/// histogram (`_bucket` lines) rather than a summary.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record a finished publish request.
pub fn record_publish(outcome: &'static str, duration_secs: f64) {
    metrics::counter!("publish_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("publish_duration_seconds", "outcome" => outcome).record(duration_secs);
}
