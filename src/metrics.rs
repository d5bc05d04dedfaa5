//! Prometheus metrics for request latency, LLM calls and crawl jobs.
//!
//! This module provides:
//! - HTTP request latency per endpoint
//! - LLM completion latency and failure counts
//! - Crawl job lifecycle counters
//! - Workflow run counters

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// LLM completion latency metric name.
pub const METRIC_LLM_LATENCY: &str = "llm_completion_latency_ms";
/// Crawl latency metric name.
pub const METRIC_CRAWL_LATENCY: &str = "crawl_latency_ms";
/// LLM completions counter metric name.
pub const METRIC_LLM_CALLS: &str = "llm_completions_total";
/// LLM failures counter metric name.
pub const METRIC_LLM_FAILURES: &str = "llm_failures_total";
/// Crawl jobs submitted counter metric name.
pub const METRIC_CRAWL_SUBMITTED: &str = "crawl_jobs_submitted_total";
/// Crawl jobs completed counter metric name.
pub const METRIC_CRAWL_COMPLETED: &str = "crawl_jobs_completed_total";
/// Crawl jobs failed counter metric name.
pub const METRIC_CRAWL_FAILED: &str = "crawl_jobs_failed_total";
/// Workflow runs counter metric name.
pub const METRIC_WORKFLOW_RUNS: &str = "workflow_runs_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(METRIC_LLM_LATENCY, "LLM completion latency in milliseconds");
    describe_histogram!(METRIC_CRAWL_LATENCY, "Product page crawl latency in milliseconds");

    describe_counter!(METRIC_LLM_CALLS, "Total number of LLM completions requested");
    describe_counter!(METRIC_LLM_FAILURES, "Total number of failed LLM completions");
    describe_counter!(METRIC_CRAWL_SUBMITTED, "Total number of crawl jobs submitted");
    describe_counter!(METRIC_CRAWL_COMPLETED, "Total number of crawl jobs completed");
    describe_counter!(METRIC_CRAWL_FAILED, "Total number of crawl jobs that failed");
    describe_counter!(METRIC_WORKFLOW_RUNS, "Total number of workflow runs by pipeline");

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> crate::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment LLM completion counter.
pub fn inc_llm_calls() {
    counter!(METRIC_LLM_CALLS).increment(1);
}

/// Increment LLM failure counter.
pub fn inc_llm_failures() {
    counter!(METRIC_LLM_FAILURES).increment(1);
}

/// Increment crawl jobs submitted counter.
pub fn inc_crawl_submitted() {
    counter!(METRIC_CRAWL_SUBMITTED).increment(1);
}

/// Increment crawl jobs completed counter.
pub fn inc_crawl_completed() {
    counter!(METRIC_CRAWL_COMPLETED).increment(1);
}

/// Increment crawl jobs failed counter.
pub fn inc_crawl_failed() {
    counter!(METRIC_CRAWL_FAILED).increment(1);
}

/// Increment workflow runs counter for a pipeline.
pub fn inc_workflow_runs(pipeline: &'static str) {
    counter!(METRIC_WORKFLOW_RUNS, "pipeline" => pipeline).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for an LLM completion.
pub fn timer_llm() -> LatencyTimer {
    LatencyTimer::new(METRIC_LLM_LATENCY)
}

/// Create a latency timer for a product crawl.
pub fn timer_crawl() -> LatencyTimer {
    LatencyTimer::new(METRIC_CRAWL_LATENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = LatencyTimer::new("test_metric");
        sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 9.0); // Allow some tolerance
        // Timer will record on drop
    }
}
