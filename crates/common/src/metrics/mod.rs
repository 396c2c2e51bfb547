//! Metrics and observability utilities
//!
//! Describes the analytics metrics and provides small recording helpers
//! with standardized naming conventions.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all LitGraph metrics
pub const METRICS_PREFIX: &str = "litgraph";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_analyses_total", METRICS_PREFIX),
        Unit::Count,
        "Total analyses run, by engine and status"
    );

    describe_histogram!(
        format!("{}_analysis_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Analysis latency in seconds"
    );

    describe_gauge!(
        format!("{}_analysis_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of ranked items returned by the last analysis"
    );

    describe_counter!(
        format!("{}_data_gaps_total", METRICS_PREFIX),
        Unit::Count,
        "Dangling references skipped during analysis"
    );

    describe_gauge!(
        format!("{}_snapshot_papers", METRICS_PREFIX),
        Unit::Count,
        "Papers in the current snapshot"
    );

    describe_gauge!(
        format!("{}_snapshot_citations", METRICS_PREFIX),
        Unit::Count,
        "Citation edges in the current snapshot"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record one analysis run
pub struct AnalysisTimer {
    start: Instant,
    engine: &'static str,
}

impl AnalysisTimer {
    /// Start tracking an analysis
    pub fn start(engine: &'static str) -> Self {
        Self {
            start: Instant::now(),
            engine,
        }
    }

    /// Seconds elapsed since start
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Record completion with the response status (`ok`, `partial`, `error`)
    pub fn finish(self, status: &str, result_count: usize) {
        let duration = self.elapsed_secs();

        counter!(
            format!("{}_analyses_total", METRICS_PREFIX),
            "engine" => self.engine,
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_analysis_duration_seconds", METRICS_PREFIX),
            "engine" => self.engine
        )
        .record(duration);

        gauge!(
            format!("{}_analysis_results_count", METRICS_PREFIX),
            "engine" => self.engine
        )
        .set(result_count as f64);
    }
}

/// Helper to record skipped dangling references
pub fn record_data_gaps(engine: &'static str, gaps: usize) {
    if gaps == 0 {
        return;
    }
    counter!(
        format!("{}_data_gaps_total", METRICS_PREFIX),
        "engine" => engine
    )
    .increment(gaps as u64);
}

/// Helper to record snapshot size when a snapshot is published
pub fn record_snapshot(papers: usize, citations: usize) {
    gauge!(format!("{}_snapshot_papers", METRICS_PREFIX)).set(papers as f64);
    gauge!(format!("{}_snapshot_citations", METRICS_PREFIX)).set(citations as f64);
}
