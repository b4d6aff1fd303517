//! The analysis engine trait.

use std::path::Path;

use async_trait::async_trait;
use docaudit_core::AnalysisResult;

use crate::error::AnalysisError;

/// An external analysis engine.
///
/// Implementations receive the path of a readable, fully written document
/// and return the engine's result unchanged. The path is only valid for the
/// duration of the call.
#[async_trait]
pub trait AnalysisEngine: Send + Sync + 'static {
    /// Analyzes the document at `path`.
    async fn analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "engine"
    }
}
