//! Prometheus recorder installation.
//!
//! The recorder is process-global; the returned handle is handed to the
//! router, which renders it at `GET /metrics`.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Latency buckets for `*_duration_seconds` histograms.
const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the global Prometheus recorder and describe every metric.
///
/// # Errors
///
/// Returns [`BuildError`] if the bucket configuration is rejected or a
/// recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            DURATION_BUCKETS,
        )?
        .install_recorder()?;

    register_metrics();
    Ok(handle)
}

fn register_metrics() {
    describe_counter!(
        "slotbook_claims_total",
        "Claim attempts by outcome (booked, already_booked, not_found, error)"
    );
    describe_histogram!(
        "slotbook_claim_duration_seconds",
        "Time from claim start to commit or rejection, including row-lock waits"
    );
    describe_counter!(
        "slotbook_cancellations_total",
        "Bookings released"
    );
    describe_counter!(
        "slotbook_slots_created_total",
        "Slots created by admins"
    );
    describe_counter!(
        "slotbook_registrations_total",
        "User accounts registered"
    );
}
