//! # Internal Metrics
//!
//! Metric descriptions and the optional Prometheus recorder. Call sites use the
//! `metrics` macros directly; without an installed recorder they are no-ops.

use anyhow::Result;
use metrics::Unit;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Registers descriptions for every metric the application emits.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "certificate_queries_total",
        Unit::Count,
        "Total number of certificate searches issued, labeled by outcome."
    );
    metrics::describe_histogram!(
        "certificate_lookup_duration_seconds",
        Unit::Seconds,
        "Time taken to query, merge and sort certificates for one domain."
    );
    metrics::describe_counter!(
        "suggestion_fallbacks_total",
        Unit::Count,
        "Number of suggestion requests that retried without their first label."
    );
    metrics::describe_counter!(
        "lookups_recorded_total",
        Unit::Count,
        "Lookup events written to the analytics store, labeled by outcome."
    );
}

/// Installs the global Prometheus recorder and returns the handle used to
/// render the exposition text.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}
