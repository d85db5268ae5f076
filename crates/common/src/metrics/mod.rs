//! Metrics and observability utilities
//!
//! Provides Prometheus-style metrics for repository lookups and
//! recommendation runs with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all CiteBuddy metrics
pub const METRICS_PREFIX: &str = "citebuddy";

/// Histogram buckets for lookup latency (in seconds)
pub const LOOKUP_BUCKETS: &[f64] = &[
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Lookup metrics
    describe_counter!(
        format!("{}_lookups_total", METRICS_PREFIX),
        Unit::Count,
        "Total article repository lookups"
    );

    describe_histogram!(
        format!("{}_lookup_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Article lookup latency in seconds"
    );

    describe_counter!(
        format!("{}_lookup_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total failed article lookups"
    );

    // Recommendation metrics
    describe_counter!(
        format!("{}_recommendations_total", METRICS_PREFIX),
        Unit::Count,
        "Total recommendation runs"
    );

    describe_histogram!(
        format!("{}_recommendation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end recommendation latency in seconds"
    );

    describe_counter!(
        format!("{}_articles_recommended_total", METRICS_PREFIX),
        Unit::Count,
        "Total identifiers returned as recommendations"
    );

    describe_counter!(
        format!("{}_candidates_suppressed_total", METRICS_PREFIX),
        Unit::Count,
        "Candidates dropped by the same-author filter"
    );

    describe_counter!(
        format!("{}_lookups_skipped_total", METRICS_PREFIX),
        Unit::Count,
        "Failed downstream lookups skipped instead of aborting"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record repository lookup metrics
pub fn record_lookup(source: &str, duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_lookups_total", METRICS_PREFIX),
        "source" => source.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_lookup_duration_seconds", METRICS_PREFIX),
            "source" => source.to_string()
        )
        .record(duration_secs);
    } else {
        counter!(
            format!("{}_lookup_errors_total", METRICS_PREFIX),
            "source" => source.to_string()
        )
        .increment(1);
    }
}

/// Helper to record a finished recommendation run
pub fn record_recommendation(
    duration_secs: f64,
    recommended: usize,
    suppressed: usize,
    skipped: usize,
    success: bool,
) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_recommendations_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(format!("{}_recommendation_duration_seconds", METRICS_PREFIX))
        .record(duration_secs);

    counter!(format!("{}_articles_recommended_total", METRICS_PREFIX))
        .increment(recommended as u64);

    counter!(format!("{}_candidates_suppressed_total", METRICS_PREFIX))
        .increment(suppressed as u64);

    counter!(format!("{}_lookups_skipped_total", METRICS_PREFIX))
        .increment(skipped as u64);
}
