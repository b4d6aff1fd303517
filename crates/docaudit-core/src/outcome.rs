//! Terminal results of a request.

use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AuditError;

/// The analysis engine's result, passed through to the client unchanged.
///
/// The service never inspects or reshapes this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(Value);

impl AnalysisResult {
    /// Wraps an engine result.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrows the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the wrapper, returning the JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for AnalysisResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Error body sent for every non-success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable reason.
    pub detail: String,
}

impl ErrorDetail {
    /// Creates an error body.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// The terminal result of handling one request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// The engine produced a result; sent with status 200.
    Success(AnalysisResult),
    /// The client sent something unacceptable.
    ClientError {
        /// 4xx status.
        status: StatusCode,
        /// Detail message.
        message: String,
    },
    /// Something failed on our side; sent with status 500.
    ServerError {
        /// Detail message, already prefixed for the client.
        message: String,
    },
}

impl RequestOutcome {
    /// Returns the HTTP status for this outcome.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::ClientError { status, .. } => *status,
            Self::ServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for [`RequestOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the JSON body: the engine result, or `{"detail": ...}`.
    pub fn body(&self) -> Value {
        match self {
            Self::Success(result) => result.as_value().clone(),
            Self::ClientError { message, .. } | Self::ServerError { message } => {
                serde_json::json!({ "detail": message })
            }
        }
    }

    /// Serializes [`RequestOutcome::body`] for the wire.
    pub fn to_body_bytes(&self) -> Bytes {
        let body = match self {
            Self::Success(result) => serde_json::to_vec(result.as_value()),
            Self::ClientError { message, .. } | Self::ServerError { message } => {
                serde_json::to_vec(&ErrorDetail::new(message.as_str()))
            }
        };
        // Serializing a Value or a plain struct cannot fail.
        Bytes::from(body.unwrap_or_default())
    }
}

impl From<AuditError> for RequestOutcome {
    fn from(err: AuditError) -> Self {
        let status = err.status_code();
        let message = err.client_message();
        if err.category().is_client_error() {
            Self::ClientError { status, message }
        } else {
            Self::ServerError { message }
        }
    }
}

impl From<AnalysisResult> for RequestOutcome {
    fn from(result: AnalysisResult) -> Self {
        Self::Success(result)
    }
}
