//! Observability for the document audit service.
//!
//! - **Logging**: structured JSON (or pretty) logs via `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! Metric recording functions are always safe to call. Until
//! [`init_metrics`] installs a recorder they are no-ops, which keeps unit
//! tests and library consumers free of global setup.
//!
//! # Example
//!
//! ```rust,ignore
//! use docaudit_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(endpoint = "analyze", "Request started");
//! ```

#![doc(html_root_url = "https://docs.rs/docaudit-telemetry/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use self::logging::{init_logging, LogConfig};
pub use self::metrics::{init_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
