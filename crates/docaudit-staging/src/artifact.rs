//! The staged artifact handle.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::TempPath;

/// A document written to the staging store.
///
/// The artifact owns its file. [`release`](Self::release) removes it, and
/// dropping an unreleased artifact removes it as well, so the file cannot
/// outlive the request that staged it.
#[derive(Debug)]
pub struct StagedArtifact {
    temp: Option<TempPath>,
    location: PathBuf,
    created_at: DateTime<Utc>,
}

impl StagedArtifact {
    pub(crate) fn new(temp: TempPath) -> Self {
        let location = temp.to_path_buf();
        docaudit_telemetry::metrics::record_artifact_staged();
        Self {
            temp: Some(temp),
            location,
            created_at: Utc::now(),
        }
    }

    /// Filesystem location handed to the analysis engine.
    pub fn path(&self) -> &Path {
        &self.location
    }

    /// When the artifact was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` until the artifact has been released.
    pub fn is_staged(&self) -> bool {
        self.temp.is_some()
    }

    /// Removes the staged file.
    ///
    /// Returns `true` if this call removed the file. Releasing twice, or
    /// releasing a file something else already deleted, is a no-op that
    /// returns `false`. Other removal failures are logged, never raised.
    pub fn release(&mut self) -> bool {
        let Some(temp) = self.temp.take() else {
            return false;
        };

        match temp.close() {
            Ok(()) => {
                docaudit_telemetry::metrics::record_artifact_released();
                tracing::debug!(path = %self.location.display(), "staged artifact released");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.location.display(), "staged artifact already removed");
                false
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.location.display(),
                    error = %e,
                    "failed to remove staged artifact"
                );
                false
            }
        }
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        if self.is_staged() {
            self.release();
        }
    }
}
