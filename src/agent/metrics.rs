//! Exported telemetry for thinking requests
//!
//! Emits `metrics` crate counters, gauges and histograms for every thinking
//! request so an external recorder (Prometheus, when the `prometheus`
//! feature is enabled) can scrape them. The in-memory statistics used by
//! reports live in `PerformanceMonitor`.
//!
//! # Metrics
//!
//! - `bella_thinking_total`: Counter of thinking requests by outcome
//! - `bella_thinking_duration_seconds`: Histogram of request latency
//! - `bella_thinking_active`: Gauge of in-flight requests
//! - `bella_provider_failures_total`: Counter of failed attempts by provider and category
//! - `bella_alerts_total`: Counter of performance alerts by type and severity
//!
//! # Examples
//!
//! ```
//! use bella::agent::metrics::ThinkingTelemetry;
//!
//! let telemetry = ThinkingTelemetry::start();
//! telemetry.record_outcome("local", true);
//! ```

use metrics::{decrement_gauge, histogram, increment_counter, increment_gauge};
use std::cell::Cell;
use std::time::Instant;

/// Telemetry for one thinking request
///
/// Increments the active gauge on creation and decrements it exactly once,
/// either when an outcome is recorded or on drop.
#[derive(Debug)]
pub struct ThinkingTelemetry {
    start: Instant,
    recorded: Cell<bool>,
}

impl ThinkingTelemetry {
    /// Begin tracking a request
    pub fn start() -> Self {
        increment_gauge!("bella_thinking_active", 1.0);
        Self {
            start: Instant::now(),
            recorded: Cell::new(false),
        }
    }

    /// Record the final outcome of the request
    ///
    /// Later calls are ignored.
    ///
    /// # Arguments
    ///
    /// * `provider` - Label of the candidate that produced the reply
    /// * `success` - Whether a model (not the canned fallback) answered
    pub fn record_outcome(&self, provider: &str, success: bool) {
        if self.recorded.replace(true) {
            return;
        }

        let outcome = if success { "success" } else { "failure" };
        increment_counter!(
            "bella_thinking_total",
            "provider" => provider.to_string(),
            "outcome" => outcome
        );
        histogram!(
            "bella_thinking_duration_seconds",
            self.start.elapsed().as_secs_f64(),
            "provider" => provider.to_string()
        );
        decrement_gauge!("bella_thinking_active", 1.0);
    }

    /// Elapsed time since the request started
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for ThinkingTelemetry {
    fn drop(&mut self) {
        if !self.recorded.get() {
            decrement_gauge!("bella_thinking_active", 1.0);
        }
    }
}

/// Count one failed provider attempt
pub fn record_provider_failure(provider: &str, category: &str) {
    increment_counter!(
        "bella_provider_failures_total",
        "provider" => provider.to_string(),
        "category" => category.to_string()
    );
}

/// Count one performance alert
pub fn record_alert(alert_type: &str, severity: &str) {
    increment_counter!(
        "bella_alerts_total",
        "type" => alert_type.to_string(),
        "severity" => severity.to_string()
    );
}

/// Initializes the metrics exporter for Prometheus
///
/// With the `prometheus` feature enabled this installs the Prometheus
/// exporter; otherwise it does nothing.
///
/// # Examples
///
/// ```
/// use bella::agent::metrics::init_metrics_exporter;
///
/// init_metrics_exporter();
/// ```
pub fn init_metrics_exporter() {
    #[cfg(feature = "prometheus")]
    {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let _ = builder.install().map_err(|e| {
            tracing::warn!("Failed to install Prometheus exporter: {}", e);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_records_once() {
        let telemetry = ThinkingTelemetry::start();
        telemetry.record_outcome("openai", true);
        telemetry.record_outcome("local", false);
        assert!(telemetry.recorded.get());
    }

    #[test]
    fn test_telemetry_drop_without_recording() {
        let telemetry = ThinkingTelemetry::start();
        assert!(!telemetry.recorded.get());
        drop(telemetry);
    }

    #[test]
    fn test_elapsed_increases() {
        let telemetry = ThinkingTelemetry::start();
        let t1 = telemetry.elapsed();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(telemetry.elapsed() > t1);
    }

    #[test]
    fn test_free_functions_do_not_panic_without_recorder() {
        record_provider_failure("qwen", "network");
        record_alert("high_response_time", "warning");
        init_metrics_exporter();
    }
}
