//! Analysis error types.

use std::time::Duration;

use docaudit_core::AuditError;
use thiserror::Error;

/// Failure of a single engine invocation.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The engine ran and reported a failure.
    #[error("{0}")]
    Engine(String),

    /// The engine did not finish before the deadline.
    #[error("analysis timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The engine could not be started.
    #[error("failed to start analysis engine: {0}")]
    Spawn(String),

    /// The engine finished but its output is not valid JSON.
    #[error("analysis engine returned invalid output: {0}")]
    InvalidOutput(String),
}

impl AnalysisError {
    /// Creates an engine failure.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    /// Label for the `outcome` metric.
    pub const fn outcome_label(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Engine(_) | Self::Spawn(_) | Self::InvalidOutput(_) => "failed",
        }
    }
}

impl From<AnalysisError> for AuditError {
    fn from(err: AnalysisError) -> Self {
        Self::analysis(err.to_string())
    }
}
