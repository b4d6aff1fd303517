//! # Docaudit Staging
//!
//! Transient on-disk staging for uploaded documents.
//!
//! The analysis engine reads documents from the filesystem, so every accepted
//! upload is written to a uniquely named file before the engine runs and
//! removed afterwards. [`StagingManager::stage`] returns a [`StagedArtifact`]
//! only once the full content is durably on disk; the artifact removes its
//! file when released or dropped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use docaudit_staging::StagingManager;
//!
//! # async fn example() -> Result<(), docaudit_staging::StagingError> {
//! let manager = StagingManager::default();
//! let mut artifact = manager.stage(Bytes::from_static(b"hello"), ".txt").await?;
//! assert!(artifact.path().exists());
//! assert!(artifact.release());
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/docaudit-staging/1.0.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod artifact;
mod error;
mod manager;

pub use artifact::StagedArtifact;
pub use error::{StagingError, StagingResult};
pub use manager::{StagingManager, DEFAULT_PREFIX};
