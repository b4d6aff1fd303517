//! Single-call engine invocation.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docaudit_core::AnalysisResult;

use crate::engine::AnalysisEngine;
use crate::error::AnalysisError;

/// Lifecycle of one invocation.
///
/// `NotStarted -> InFlight -> {Succeeded, Failed}`. There are no retries,
/// so an invocation never returns to `InFlight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    /// The engine has not been called yet.
    NotStarted,
    /// The engine call is running.
    InFlight,
    /// The engine returned a result.
    Succeeded,
    /// The engine failed or timed out.
    Failed,
}

impl InvocationState {
    /// Returns `true` for `Succeeded` and `Failed`.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// The terminal state for a finished call.
    pub const fn settled<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Succeeded,
            Err(_) => Self::Failed,
        }
    }

    /// Returns `true` if moving to `next` is a legal transition.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::InFlight) | (Self::InFlight, Self::Succeeded | Self::Failed)
        )
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::InFlight => "in_flight",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Calls one analysis engine, at most once per invocation.
///
/// The invoker holds no per-call state and is shared across requests.
#[derive(Clone)]
pub struct AnalysisInvoker {
    engine: Arc<dyn AnalysisEngine>,
    timeout: Option<Duration>,
}

impl AnalysisInvoker {
    /// Creates an invoker with no deadline.
    pub fn new(engine: Arc<dyn AnalysisEngine>) -> Self {
        Self {
            engine,
            timeout: None,
        }
    }

    /// Sets the deadline for each call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets or clears the deadline.
    pub fn with_optional_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured deadline.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Name of the wrapped engine.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Runs the engine on the document at `path`.
    ///
    /// The result is returned exactly as the engine produced it. When the
    /// deadline elapses the engine future is dropped, which cancels the call.
    pub async fn invoke(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let state = self.transition(InvocationState::NotStarted, InvocationState::InFlight);

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.engine.analyze(path)).await {
                Ok(result) => result,
                Err(_) => Err(AnalysisError::Timeout(limit)),
            },
            None => self.engine.analyze(path).await,
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let state = self.transition(state, InvocationState::settled(&result));
        debug_assert!(state.is_terminal());
        match &result {
            Ok(_) => {
                docaudit_telemetry::metrics::record_analysis("succeeded");
                tracing::info!(engine = %self.engine.name(), elapsed_ms, %state, "analysis succeeded");
            }
            Err(e) => {
                docaudit_telemetry::metrics::record_analysis(e.outcome_label());
                tracing::warn!(engine = %self.engine.name(), elapsed_ms, %state, error = %e, "analysis failed");
            }
        }

        result
    }

    fn transition(&self, from: InvocationState, to: InvocationState) -> InvocationState {
        debug_assert!(from.can_transition_to(to));
        tracing::debug!(engine = %self.engine.name(), %from, %to, "invocation state changed");
        to
    }
}

impl fmt::Debug for AnalysisInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisInvoker")
            .field("engine", &self.engine.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
