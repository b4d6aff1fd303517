//! The request-handling core behind the HTTP endpoints.
//!
//! [`Gateway`] owns everything one `/analyze` request needs: the accepted
//! extension set, the staging store and the engine invoker. It knows nothing
//! about HTTP; the server turns its [`RequestOutcome`] into a response.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use docaudit_config::DocauditConfig;
use docaudit_core::{
    AcceptedExtensions, AnalysisResult, AuditError, AuditResult, RequestOutcome, ServiceInfo,
    StatusInfo, UploadedDocument,
};
use docaudit_engine::{AnalysisEngine, AnalysisInvoker};
use docaudit_staging::StagingManager;
use futures_util::FutureExt;

/// Validates, stages and analyzes uploaded documents.
///
/// Requests share nothing mutable, so one gateway serves any number of
/// concurrent requests.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use bytes::Bytes;
/// use docaudit_engine::{AnalysisInvoker, CommandEngine};
/// use docaudit_server::Gateway;
///
/// # async fn example() {
/// let invoker = AnalysisInvoker::new(Arc::new(CommandEngine::new("audit-engine")));
/// let gateway = Gateway::new(invoker);
///
/// let outcome = gateway.analyze(Some("notes.txt"), Bytes::from_static(b"hello")).await;
/// println!("{} {}", outcome.status_code(), outcome.body());
/// # }
/// ```
#[derive(Debug)]
pub struct Gateway {
    accepted: AcceptedExtensions,
    staging: StagingManager,
    invoker: AnalysisInvoker,
}

impl Gateway {
    /// Creates a gateway with the default extension set and staging store.
    #[must_use]
    pub fn new(invoker: AnalysisInvoker) -> Self {
        Self {
            accepted: AcceptedExtensions::default(),
            staging: StagingManager::default(),
            invoker,
        }
    }

    /// Builds a gateway from service configuration around `engine`.
    #[must_use]
    pub fn from_config(config: &DocauditConfig, engine: Arc<dyn AnalysisEngine>) -> Self {
        let mut staging = StagingManager::new().with_prefix(config.staging.prefix.clone());
        if let Some(dir) = &config.staging.dir {
            staging = staging.with_dir(dir.clone());
        }

        let invoker = AnalysisInvoker::new(engine).with_optional_timeout(config.engine.timeout());

        Self::new(invoker)
            .with_accepted(config.upload.accepted())
            .with_staging(staging)
    }

    /// Replaces the accepted extension set.
    #[must_use]
    pub fn with_accepted(mut self, accepted: AcceptedExtensions) -> Self {
        self.accepted = accepted;
        self
    }

    /// Replaces the staging store.
    #[must_use]
    pub fn with_staging(mut self, staging: StagingManager) -> Self {
        self.staging = staging;
        self
    }

    /// The accepted extension set.
    pub fn accepted(&self) -> &AcceptedExtensions {
        &self.accepted
    }

    /// The staging store.
    pub fn staging(&self) -> &StagingManager {
        &self.staging
    }

    /// Body of `GET /`.
    pub fn root(&self) -> ServiceInfo {
        ServiceInfo::default()
    }

    /// Body of `GET /status`.
    pub fn status(&self) -> StatusInfo {
        StatusInfo::ok()
    }

    /// Handles one uploaded document.
    ///
    /// Rejected uploads never touch the staging store or the engine. An
    /// accepted upload is staged, analyzed exactly once, and its staged file
    /// is removed before this returns, whatever the engine did. Dropping the
    /// returned future early removes the file as well.
    pub async fn analyze(&self, filename: Option<&str>, content: Bytes) -> RequestOutcome {
        match self.run(filename, content).await {
            Ok(result) => RequestOutcome::Success(result),
            Err(err) => {
                if err.category().is_client_error() {
                    tracing::info!(error = %err, "upload rejected");
                } else {
                    tracing::error!(error = %err, category = err.category().as_str(), "analysis request failed");
                }
                RequestOutcome::from(err)
            }
        }
    }

    async fn run(&self, filename: Option<&str>, content: Bytes) -> AuditResult<AnalysisResult> {
        let document = UploadedDocument::validate(filename, content, &self.accepted)?;
        tracing::debug!(
            filename = document.filename(),
            extension = document.extension(),
            size = document.len(),
            "upload accepted"
        );

        let extension = document.extension().to_string();
        let mut artifact = self
            .staging
            .stage(document.into_content(), &extension)
            .await
            .map_err(|e| AuditError::staging(e.to_string()))?;

        let invoked = AssertUnwindSafe(self.invoker.invoke(artifact.path()))
            .catch_unwind()
            .await;

        self.staging.release(&mut artifact);

        match invoked {
            Ok(result) => result.map_err(AuditError::from),
            Err(panic) => Err(AuditError::unexpected(panic_message(panic.as_ref()))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned());

    match detail {
        Some(detail) => format!("analysis engine panicked: {detail}"),
        None => "analysis engine panicked".to_string(),
    }
}
