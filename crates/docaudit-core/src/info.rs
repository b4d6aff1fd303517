//! Bodies for the informational endpoints.

use serde::{Deserialize, Serialize};

/// Service title reported by `GET /`.
pub const SERVICE_TITLE: &str = "Document Audit API";

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service title.
    pub message: String,
    /// Service version.
    pub version: String,
}

impl ServiceInfo {
    /// Creates the info body for the given title and version.
    pub fn new(message: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            version: version.into(),
        }
    }
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self::new(SERVICE_TITLE, crate::VERSION)
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    /// Always `"ok"` while the process can answer.
    pub status: String,
    /// Liveness message.
    pub message: String,
}

impl StatusInfo {
    /// The liveness body.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Server is running".to_string(),
        }
    }
}
