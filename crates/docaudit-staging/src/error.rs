//! Staging error types.

use std::io;

use thiserror::Error;

/// Result type for staging operations.
pub type StagingResult<T> = Result<T, StagingError>;

/// Errors raised while staging an upload.
///
/// Messages carry the I/O error kind only. Filesystem paths never appear,
/// since the message may reach the client.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The staging directory could not be opened or a file created in it.
    #[error("staging store unavailable: {kind}")]
    Unavailable {
        /// The underlying I/O error kind.
        kind: io::ErrorKind,
    },

    /// The file was created but the content could not be written in full.
    #[error("failed to write staged document: {kind}")]
    Write {
        /// The underlying I/O error kind.
        kind: io::ErrorKind,
    },

    /// The blocking write task did not complete.
    #[error("staging task failed")]
    Task,
}

impl StagingError {
    pub(crate) fn unavailable(err: &io::Error) -> Self {
        Self::Unavailable { kind: err.kind() }
    }

    pub(crate) fn write(err: &io::Error) -> Self {
        Self::Write { kind: err.kind() }
    }

    /// Returns the I/O error kind, if the failure came from the filesystem.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Unavailable { kind } | Self::Write { kind } => Some(*kind),
            Self::Task => None,
        }
    }
}
