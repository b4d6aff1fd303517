//! The staging manager.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::TempPath;

use crate::artifact::StagedArtifact;
use crate::error::{StagingError, StagingResult};

/// Filename prefix for staged documents.
pub const DEFAULT_PREFIX: &str = "docaudit-";

/// Creates and releases staged artifacts.
///
/// Every call to [`stage`](Self::stage) creates a new file with a random
/// name, so concurrent requests never share or overwrite an artifact.
#[derive(Debug, Clone)]
pub struct StagingManager {
    dir: Option<PathBuf>,
    prefix: String,
}

impl StagingManager {
    /// Creates a manager that stages into the OS temporary directory.
    pub fn new() -> Self {
        Self {
            dir: None,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Stages into `dir` instead of the OS temporary directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Sets the filename prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// The configured staging directory, if not the OS default.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// The filename prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Writes `content` to a new staged file ending in `extension`.
    ///
    /// The artifact is returned only after the content has been written in
    /// full and synced. On failure any partially written file is removed
    /// before the error is returned.
    pub async fn stage(&self, content: Bytes, extension: &str) -> StagingResult<StagedArtifact> {
        let dir = self.dir.clone();
        let prefix = self.prefix.clone();
        let suffix = extension.to_string();
        let size = content.len();

        let temp = tokio::task::spawn_blocking(move || write_staged(dir.as_deref(), &prefix, &suffix, &content))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "staging task did not complete");
                StagingError::Task
            })??;

        let artifact = StagedArtifact::new(temp);
        tracing::debug!(path = %artifact.path().display(), size, "document staged");
        Ok(artifact)
    }

    /// Releases `artifact`. See [`StagedArtifact::release`].
    pub fn release(&self, artifact: &mut StagedArtifact) -> bool {
        artifact.release()
    }
}

impl Default for StagingManager {
    fn default() -> Self {
        Self::new()
    }
}

fn write_staged(dir: Option<&Path>, prefix: &str, suffix: &str, content: &[u8]) -> StagingResult<TempPath> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(suffix);

    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| StagingError::unavailable(&e))?;

    // Dropping `file` on error removes the partial write.
    file.write_all(content).map_err(|e| StagingError::write(&e))?;
    file.as_file().sync_all().map_err(|e| StagingError::write(&e))?;

    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::io;

    fn manager_in(dir: &Path) -> StagingManager {
        StagingManager::new().with_dir(dir)
    }

    #[tokio::test]
    async fn test_stage_writes_full_content() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());

        let artifact = manager
            .stage(Bytes::from_static(b"quarterly numbers"), ".txt")
            .await
            .unwrap();

        assert!(artifact.is_staged());
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"quarterly numbers");
        assert!(artifact.path().starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_stage_name_has_prefix_and_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path()).with_prefix("audit-");

        let artifact = manager.stage(Bytes::new(), ".pdf").await.unwrap();
        let name = artifact.path().file_name().unwrap().to_string_lossy().into_owned();

        assert!(name.starts_with("audit-"));
        assert!(name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_stage_empty_content() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = manager_in(dir.path()).stage(Bytes::new(), ".txt").await.unwrap();
        assert_eq!(std::fs::metadata(artifact.path()).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_release_removes_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());

        let mut artifact = manager.stage(Bytes::from_static(b"x"), ".txt").await.unwrap();
        let path = artifact.path().to_path_buf();

        assert!(manager.release(&mut artifact));
        assert!(!path.exists());
        assert!(!artifact.is_staged());
        assert!(!manager.release(&mut artifact));
    }

    #[tokio::test]
    async fn test_release_after_external_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = manager_in(dir.path())
            .stage(Bytes::from_static(b"x"), ".pdf")
            .await
            .unwrap();

        std::fs::remove_file(artifact.path()).unwrap();
        assert!(!artifact.release());
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = manager_in(dir.path())
            .stage(Bytes::from_static(b"x"), ".pdf")
            .await
            .unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_dir_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let manager = manager_in(&missing);

        let err = manager.stage(Bytes::from_static(b"x"), ".txt").await.unwrap_err();

        assert!(matches!(err, StagingError::Unavailable { .. }));
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
        assert!(!err.to_string().contains("does-not-exist"));
    }

    #[tokio::test]
    async fn test_concurrent_stages_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.stage(Bytes::from(vec![i; 64]), ".txt").await.unwrap()
            }));
        }

        let mut artifacts = Vec::new();
        for handle in handles {
            artifacts.push(handle.await.unwrap());
        }

        let paths: HashSet<_> = artifacts.iter().map(|a| a.path().to_path_buf()).collect();
        assert_eq!(paths.len(), 16);
        for artifact in &artifacts {
            let content = std::fs::read(artifact.path()).unwrap();
            assert_eq!(content.len(), 64);
            assert!(content.iter().all(|b| *b == content[0]));
        }

        drop(artifacts);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_defaults() {
        let manager = StagingManager::default();
        assert_eq!(manager.prefix(), DEFAULT_PREFIX);
        assert!(manager.dir().is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_staged_bytes_match_upload(
            content in proptest::collection::vec(any::<u8>(), 0..4096),
            pdf in any::<bool>(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let dir = tempfile::tempdir().unwrap();
            let manager = manager_in(dir.path());
            let suffix = if pdf { ".pdf" } else { ".txt" };

            let mut artifact = runtime
                .block_on(manager.stage(Bytes::from(content.clone()), suffix))
                .unwrap();
            prop_assert_eq!(std::fs::read(artifact.path()).unwrap(), content);

            prop_assert!(manager.release(&mut artifact));
            prop_assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        }
    }

    #[test]
    fn test_stage_preserves_nul_and_invalid_utf8() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path());
        let content = vec![0x00, 0xff, 0xfe, 0x00, b'%', b'P', b'D', b'F', 0xc3, 0x28];

        let artifact = runtime
            .block_on(manager.stage(Bytes::from(content.clone()), ".pdf"))
            .unwrap();

        assert_eq!(std::fs::read(artifact.path()).unwrap(), content);
    }
}
