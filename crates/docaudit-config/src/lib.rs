//! Typed configuration for the document audit service.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8000"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 600000
//!
//! [upload]
//! max_body_bytes = 52428800
//! max_fields = 16
//! accepted_extensions = [".pdf", ".txt"]
//!
//! [staging]
//! dir = "/var/lib/docaudit/staging"
//! prefix = "docaudit-"
//!
//! [engine]
//! program = "python3"
//! args = ["-m", "pipeline"]
//! timeout_secs = 300
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = false
//! addr = "0.0.0.0:9090"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `DOCAUDIT__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `DOCAUDIT__ENGINE__PROGRAM=/opt/audit/bin/engine`
//! - `DOCAUDIT__UPLOAD__ACCEPTED_EXTENSIONS=.pdf,.txt`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{DocauditConfig, DocauditConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{
    EngineConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig, StagingConfig,
    UploadConfig,
};
