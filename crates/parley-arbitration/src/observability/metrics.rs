//! Prometheus Metrics
//!
//! Defines and initializes the arbitration metrics. Recording without an
//! installed recorder is a no-op.
//!
//! Metrics tracked:
//! - `parley_arbitrations_started_total` - counter of started arbitrations by strategy
//! - `parley_arbitration_attempts_total` - counter of discovery lookups issued
//! - `parley_arbitration_outcomes_total` - counter of finished arbitrations by outcome
//! - `parley_arbitration_duration_seconds` - histogram of time to outcome

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// State containing the Prometheus handle for metrics export
#[derive(Clone)]
pub struct MetricsState {
    pub prometheus_handle: PrometheusHandle,
}

impl MetricsState {
    /// Text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Install the Prometheus recorder and return the handle for exporting.
pub fn init_metrics() -> Result<MetricsState, Box<dyn std::error::Error + Send + Sync>> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_metric_descriptions();

    Ok(MetricsState {
        prometheus_handle: handle,
    })
}

fn register_metric_descriptions() {
    describe_counter!(
        "parley_arbitrations_started_total",
        "Total number of arbitrations started"
    );
    describe_counter!(
        "parley_arbitration_attempts_total",
        "Total number of discovery lookups issued by arbitrations"
    );
    describe_counter!(
        "parley_arbitration_outcomes_total",
        "Total number of finished arbitrations by outcome"
    );
    describe_histogram!(
        "parley_arbitration_duration_seconds",
        "Time from start to outcome of an arbitration in seconds"
    );
}

/// Record that an arbitration was started
pub fn record_arbitration_started(strategy: &str) {
    counter!("parley_arbitrations_started_total", "strategy" => strategy.to_string()).increment(1);
}

/// Record one discovery lookup
pub fn record_attempt(strategy: &str) {
    counter!("parley_arbitration_attempts_total", "strategy" => strategy.to_string()).increment(1);
}

/// Record how an arbitration ended and how long it took
pub fn record_outcome(outcome: &str, duration: Duration) {
    counter!("parley_arbitration_outcomes_total", "outcome" => outcome.to_string()).increment(1);
    histogram!(
        "parley_arbitration_duration_seconds",
        "outcome" => outcome.to_string()
    )
    .record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_recording() {
        // These functions should not panic when called
        record_arbitration_started("HIGHEST_PRIORITY");
        record_attempt("HIGHEST_PRIORITY");
        record_outcome("succeeded", Duration::from_millis(120));
        record_outcome("timed_out", Duration::from_secs(600));
    }
}
