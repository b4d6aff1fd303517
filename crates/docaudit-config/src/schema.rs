//! Configuration schema types.
//!
//! One struct per configuration section. Every field has a default, and
//! unknown fields are rejected.

use std::path::PathBuf;
use std::time::Duration;

use docaudit_core::{AcceptedExtensions, DEFAULT_ACCEPTED_EXTENSIONS};
use serde::{Deserialize, Serialize};

/// HTTP server section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Whole-request timeout in milliseconds. Covers upload, staging and analysis.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    /// Shutdown timeout as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    600_000
}

/// Upload acceptance section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Maximum number of multipart fields.
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,

    /// Accepted filename extensions, with leading dot.
    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,
}

impl UploadConfig {
    /// The accepted extension set.
    pub fn accepted(&self) -> AcceptedExtensions {
        AcceptedExtensions::new(&self.accepted_extensions)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            max_fields: default_max_fields(),
            accepted_extensions: default_accepted_extensions(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_max_fields() -> usize {
    16
}

fn default_accepted_extensions() -> Vec<String> {
    DEFAULT_ACCEPTED_EXTENSIONS.iter().map(ToString::to_string).collect()
}

/// Staging store section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StagingConfig {
    /// Directory for staged documents. Unset means the OS temp directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Filename prefix for staged documents.
    #[serde(default = "default_staging_prefix")]
    pub prefix: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: default_staging_prefix(),
        }
    }
}

fn default_staging_prefix() -> String {
    "docaudit-".to_string()
}

/// Analysis engine section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Engine executable.
    #[serde(default = "default_engine_program")]
    pub program: String,

    /// Arguments placed before the document path.
    #[serde(default = "default_engine_args")]
    pub args: Vec<String>,

    /// Per-invocation deadline in seconds. Zero disables the deadline.
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

impl EngineConfig {
    /// The invocation deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_engine_program(),
            args: default_engine_args(),
            timeout_secs: default_engine_timeout(),
        }
    }
}

fn default_engine_program() -> String {
    "python3".to_string()
}

fn default_engine_args() -> Vec<String> {
    vec!["-m".to_string(), "pipeline".to_string()]
}

fn default_engine_timeout() -> u64 {
    300
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl LoggingConfig {
    /// Converts to the telemetry crate's logging settings.
    pub fn to_log_config(&self) -> docaudit_telemetry::LogConfig {
        docaudit_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: false,
            file_line_info: self.include_location,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Enable the Prometheus scrape listener.
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus scrape listener address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl MetricsConfig {
    /// Converts to the telemetry crate's metrics settings.
    pub fn to_metrics_config(&self) -> docaudit_telemetry::MetricsConfig {
        docaudit_telemetry::MetricsConfig {
            enabled: self.enabled,
            addr: self.addr.clone(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_true() -> bool {
    true
}
