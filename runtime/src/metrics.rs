//! Prometheus metrics for observability and monitoring.
//!
//! Metrics are recorded through the `metrics` facade; without an installed
//! recorder every call is a no-op. Installed recorders see:
//! - Store folds and their duration
//! - Orchestrated requests and failures, labelled by verb
//! - Transport call latency, labelled by verb
//!
//! # Example
//!
//! ```rust,no_run
//! use keyslot_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new();
//! server.start()?;
//!
//! // ... drive some requests ...
//!
//! if let Some(text) = server.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use keyslot_core::transport::Verb;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder with an in-process render handle.
#[derive(Default)]
pub struct MetricsServer {
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a server that has not installed its recorder yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the global recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// Only one recorder can be installed per process. If one already is
    /// (e.g. another test got there first), this logs a warning and returns
    /// `Ok` without a render handle.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store
    describe_counter!(
        "store_actions_processed_total",
        "Total number of actions folded into a store"
    );
    describe_histogram!(
        "reducer_execution_duration_seconds",
        "Time taken to fold one action"
    );

    // Orchestrators
    describe_counter!(
        "slot_requests_total",
        "Total number of orchestrated requests, by verb"
    );
    describe_counter!(
        "slot_failures_total",
        "Total number of orchestrated requests that failed, by verb"
    );

    // Transport
    describe_histogram!(
        "transport_duration_seconds",
        "Time spent waiting on the transport, by verb"
    );
}

/// Store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record one folded action.
    pub fn record_action(duration: Duration) {
        counter!("store_actions_processed_total").increment(1);
        histogram!("reducer_execution_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Orchestrator metrics recorder.
pub struct OrchestratorMetrics;

impl OrchestratorMetrics {
    /// Record a started request.
    pub fn record_request(verb: Verb) {
        counter!("slot_requests_total", "verb" => verb.as_str()).increment(1);
    }

    /// Record a failed request.
    pub fn record_failure(verb: Verb) {
        counter!("slot_failures_total", "verb" => verb.as_str()).increment(1);
    }

    /// Record how long the transport took to settle.
    pub fn record_transport(verb: Verb, duration: Duration) {
        histogram!("transport_duration_seconds", "verb" => verb.as_str())
            .record(duration.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let server = MetricsServer::new();
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
    }

    #[test]
    fn test_metrics_server_render() -> Result<(), MetricsError> {
        let mut server = MetricsServer::new();
        server.start()?;

        StoreMetrics::record_action(Duration::from_micros(40));
        OrchestratorMetrics::record_request(Verb::Get);
        OrchestratorMetrics::record_failure(Verb::Post);
        OrchestratorMetrics::record_transport(Verb::Get, Duration::from_millis(12));

        // Another test may have installed the recorder first; metrics are
        // still recorded, there is just no handle here to render them.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("store_actions_processed_total"));
            assert!(rendered.contains("slot_requests_total"));
            assert!(rendered.contains("verb=\"GET\""));
            assert!(rendered.contains("slot_failures_total"));
        }
        Ok(())
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        StoreMetrics::record_action(Duration::ZERO);
        OrchestratorMetrics::record_request(Verb::Delete);
    }
}
