//! Prometheus metrics.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `docaudit_requests_total` | Counter | `endpoint`, `status` | Total requests |
//! | `docaudit_request_duration_seconds` | Histogram | `endpoint` | Request latency |
//! | `docaudit_in_flight_requests` | Gauge | - | In-flight requests |
//! | `docaudit_artifacts_staged_total` | Counter | - | Artifacts written |
//! | `docaudit_artifacts_released_total` | Counter | - | Artifacts removed |
//! | `docaudit_analysis_total` | Counter | `outcome` | Engine invocations |

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Total requests by endpoint and status.
pub const REQUESTS_TOTAL: &str = "docaudit_requests_total";
/// Request latency histogram.
pub const REQUEST_DURATION_SECONDS: &str = "docaudit_request_duration_seconds";
/// Requests currently being handled.
pub const IN_FLIGHT_REQUESTS: &str = "docaudit_in_flight_requests";
/// Artifacts written to the staging store.
pub const ARTIFACTS_STAGED_TOTAL: &str = "docaudit_artifacts_staged_total";
/// Artifacts removed from the staging store.
pub const ARTIFACTS_RELEASED_TOTAL: &str = "docaudit_artifacts_released_total";
/// Engine invocations by outcome.
pub const ANALYSIS_TOTAL: &str = "docaudit_analysis_total";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address of the Prometheus scrape listener (e.g. "0.0.0.0:9090").
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus recorder and starts the scrape listener.
///
/// Must be called from within a Tokio runtime. Does nothing when
/// `config.enabled` is false.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if the recorder cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "metrics exporter stopped");
        }
    });

    register_metric_descriptions();
    tracing::info!(%addr, "metrics listener started");

    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests processed");
    describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    describe_gauge!(IN_FLIGHT_REQUESTS, "Number of HTTP requests currently being processed");
    describe_counter!(ARTIFACTS_STAGED_TOTAL, "Uploads written to the staging store");
    describe_counter!(ARTIFACTS_RELEASED_TOTAL, "Staged uploads removed from the staging store");
    describe_counter!(ANALYSIS_TOTAL, "Analysis engine invocations by outcome");
}

/// Records a completed request.
///
/// * `endpoint` - Route label (e.g. "analyze", "status")
/// * `status_code` - HTTP status code sent
/// * `duration` - Time spent handling the request
pub fn record_request(endpoint: &'static str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "endpoint" => endpoint,
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "endpoint" => endpoint).record(duration.as_secs_f64());
}

/// Records a newly staged artifact.
pub fn record_artifact_staged() {
    counter!(ARTIFACTS_STAGED_TOTAL).increment(1);
}

/// Records a released artifact.
pub fn record_artifact_released() {
    counter!(ARTIFACTS_RELEASED_TOTAL).increment(1);
}

/// Records the outcome of one engine invocation ("succeeded", "failed", "timeout").
pub fn record_analysis(outcome: &'static str) {
    counter!(ANALYSIS_TOTAL, "outcome" => outcome).increment(1);
}

/// Guard that tracks one in-flight request.
///
/// Decrements the gauge on drop, including during unwinding.
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
    }

    #[test]
    fn test_disabled_is_noop() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not-an-address".to_string(),
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_record_functions_dont_panic() {
        record_request("analyze", 200, Duration::from_millis(10));
        record_artifact_staged();
        record_artifact_released();
        record_analysis("succeeded");
        let guard = InFlightGuard::new();
        drop(guard);
    }
}
