//! Main configuration types.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, EngineConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig,
    StagingConfig, UploadConfig,
};

/// Complete service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use docaudit_config::DocauditConfig;
///
/// let config = DocauditConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8000");
/// assert_eq!(config.upload.accepted_extensions, vec![".pdf", ".txt"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DocauditConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upload acceptance configuration.
    #[serde(default)]
    pub upload: UploadConfig,

    /// Staging store configuration.
    #[serde(default)]
    pub staging: StagingConfig,

    /// Analysis engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl DocauditConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> DocauditConfigBuilder {
        DocauditConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.upload.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "upload.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.upload.max_fields == 0 {
            return Err(ConfigError::invalid_value(
                "upload.max_fields",
                "must be greater than zero",
            ));
        }

        if self.upload.accepted_extensions.is_empty() {
            return Err(ConfigError::invalid_value(
                "upload.accepted_extensions",
                "at least one extension is required",
            ));
        }

        if let Some(ext) = self
            .upload
            .accepted_extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(ConfigError::invalid_value(
                "upload.accepted_extensions",
                format!("'{ext}' must start with '.' followed by at least one character"),
            ));
        }

        if self.engine.program.trim().is_empty() {
            return Err(ConfigError::invalid_value("engine.program", "must not be empty"));
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Local development preset: pretty debug logs, bound to localhost.
    ///
    /// ```
    /// use docaudit_config::DocauditConfig;
    ///
    /// let config = DocauditConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.server.http_addr = "127.0.0.1:8000".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;

        config
    }

    /// Production preset: JSON logs and metrics enabled.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.metrics.enabled = true;

        config
    }
}

/// Builder for [`DocauditConfig`].
#[derive(Debug, Default)]
pub struct DocauditConfigBuilder {
    server: Option<ServerConfig>,
    upload: Option<UploadConfig>,
    staging: Option<StagingConfig>,
    engine: Option<EngineConfig>,
    logging: Option<LoggingConfig>,
    metrics: Option<MetricsConfig>,
}

impl DocauditConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the upload configuration.
    #[must_use]
    pub fn upload(mut self, upload: UploadConfig) -> Self {
        self.upload = Some(upload);
        self
    }

    /// Set the staging configuration.
    #[must_use]
    pub fn staging(mut self, staging: StagingConfig) -> Self {
        self.staging = Some(staging);
        self
    }

    /// Set the engine configuration.
    #[must_use]
    pub fn engine(mut self, engine: EngineConfig) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> DocauditConfig {
        DocauditConfig {
            server: self.server.unwrap_or_default(),
            upload: self.upload.unwrap_or_default(),
            staging: self.staging.unwrap_or_default(),
            engine: self.engine.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<DocauditConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
