//! Metrics sink port and the metric names emitted by the engine.

/// Label pairs attached to a metric observation.
pub type Labels<'a> = &'a [(&'a str, &'a str)];

/// Destination for counters, gauges and histogram observations.
pub trait MetricsSink: Send + Sync {
    fn increment_counter(&self, name: &str, labels: Labels<'_>, value: u64);

    fn set_gauge(&self, name: &str, labels: Labels<'_>, value: f64);

    fn observe_histogram(&self, name: &str, labels: Labels<'_>, value: f64);
}

pub const TRANSFORMATIONS_TOTAL: &str = "transformations_total";
pub const TRANSFORMATION_ERRORS_TOTAL: &str = "transformation_errors_total";
pub const VERIFICATION_ATTEMPTS_TOTAL: &str = "verification_attempts_total";
pub const VERIFICATION_SUCCESSES_TOTAL: &str = "verification_successes_total";
pub const VERIFICATION_SUCCESS_RATIO: &str = "verification_success_ratio";
pub const TRANSFORMATION_DURATION_SECONDS: &str = "transformation_duration_seconds";
pub const COMPLEXITY_REDUCTION_PERCENTAGE: &str = "complexity_reduction_percentage";
pub const FILE_SIZE_REDUCTION_PERCENTAGE: &str = "file_size_reduction_percentage";
pub const MODEL_FALLBACKS_TOTAL: &str = "model_fallbacks_total";
pub const JOBS_TOTAL: &str = "jobs_total";
