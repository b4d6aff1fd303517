//! Error types for the document audit service.
//!
//! [`AuditError`] is the single error type the request gateway reasons about.
//! Component errors (staging, analysis) are converted into it at the gateway
//! boundary, and it is collapsed into a [`RequestOutcome`](crate::RequestOutcome)
//! only when the response is built.
//!
//! | Variant | Category | Status |
//! |---|---|---|
//! | `UnsupportedExtension` | `Validation` | 400 |
//! | `BadRequest` | `BadRequest` | 400 |
//! | `PayloadTooLarge` | `PayloadTooLarge` | 413 |
//! | `Staging` | `Staging` | 500 |
//! | `Analysis` | `Analysis` | 500 |
//! | `Unexpected` | `Internal` | 500 |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`AuditError`].
pub type AuditResult<T> = Result<T, AuditError>;

/// Categories of errors for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Upload rejected by extension validation.
    Validation,
    /// Malformed request (bad multipart body, missing file field).
    BadRequest,
    /// Request body exceeds the configured ceiling.
    PayloadTooLarge,
    /// Staging store unavailable or write failure.
    Staging,
    /// The analysis engine reported a failure.
    Analysis,
    /// Any fault not matching the above.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Staging | Self::Analysis | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if the client caused the error.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation | Self::BadRequest | Self::PayloadTooLarge)
    }

    /// Returns the category as a static label, suitable for metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::BadRequest => "bad_request",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Staging => "staging",
            Self::Analysis => "analysis",
            Self::Internal => "internal",
        }
    }
}

/// Standard error type for the document audit service.
///
/// # Example
///
/// ```
/// use docaudit_core::{AuditError, ErrorCategory};
///
/// let err = AuditError::unsupported_extension(".docx", [".pdf", ".txt"]);
/// assert_eq!(err.category(), ErrorCategory::Validation);
/// assert_eq!(
///     err.to_string(),
///     "Unsupported file type '.docx'. Allowed types: .pdf, .txt"
/// );
/// ```
#[derive(Error, Debug)]
pub enum AuditError {
    /// The upload's extension is not in the accepted set.
    #[error("{}", unsupported_message(.extension, .accepted))]
    UnsupportedExtension {
        /// The rejected extension (lower-cased, may be empty).
        extension: String,
        /// The accepted set, in configured order.
        accepted: Vec<String>,
    },

    /// The request could not be interpreted as an upload.
    #[error("{message}")]
    BadRequest {
        /// Human-readable error message.
        message: String,
    },

    /// The request body exceeded the configured ceiling.
    #[error("Payload too large: maximum upload size is {max_bytes} bytes")]
    PayloadTooLarge {
        /// The configured ceiling.
        max_bytes: usize,
    },

    /// The upload could not be staged.
    ///
    /// The message is already sanitized: it never carries a filesystem path.
    #[error("{message}")]
    Staging {
        /// Sanitized error message.
        message: String,
    },

    /// The analysis engine failed.
    #[error("{message}")]
    Analysis {
        /// The engine's failure message.
        message: String,
    },

    /// Any other fault caught at the gateway boundary.
    #[error("{message}")]
    Unexpected {
        /// Human-readable error message.
        message: String,
    },
}

fn unsupported_message(extension: &str, accepted: &[String]) -> String {
    let allowed = accepted.join(", ");
    if extension.is_empty() {
        format!("Unsupported file type (no extension). Allowed types: {allowed}")
    } else {
        format!("Unsupported file type '{extension}'. Allowed types: {allowed}")
    }
}

impl AuditError {
    /// Creates an unsupported extension error.
    #[must_use]
    pub fn unsupported_extension<I, S>(extension: impl Into<String>, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnsupportedExtension {
            extension: extension.into(),
            accepted: accepted.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a payload too large error.
    #[must_use]
    pub const fn payload_too_large(max_bytes: usize) -> Self {
        Self::PayloadTooLarge { max_bytes }
    }

    /// Creates a staging error.
    #[must_use]
    pub fn staging(message: impl Into<String>) -> Self {
        Self::Staging {
            message: message.into(),
        }
    }

    /// Creates an analysis error.
    #[must_use]
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    /// Creates an unexpected fault error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedExtension { .. } => ErrorCategory::Validation,
            Self::BadRequest { .. } => ErrorCategory::BadRequest,
            Self::PayloadTooLarge { .. } => ErrorCategory::PayloadTooLarge,
            Self::Staging { .. } => ErrorCategory::Staging,
            Self::Analysis { .. } => ErrorCategory::Analysis,
            Self::Unexpected { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns the message sent to the client in the `detail` field.
    ///
    /// Client errors are reported verbatim; server errors are prefixed so the
    /// client can tell them apart from input problems.
    #[must_use]
    pub fn client_message(&self) -> String {
        if self.category().is_client_error() {
            self.to_string()
        } else {
            format!("Internal server error: {self}")
        }
    }
}
