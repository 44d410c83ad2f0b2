//! Error types for repository access.

use std::path::PathBuf;

use sleep_ingest::IngestError;
use thiserror::Error;

/// Errors that can occur while listing or retrieving dataset files.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// SHA256 checksum verification failed.
    #[error("checksum verification failed for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The repository does not hold the requested file.
    #[error("file not found in repository: {relative_path}")]
    NotFound { relative_path: String },

    /// A relative path escapes the repository root.
    #[error("invalid repository path: {relative_path}")]
    InvalidPath { relative_path: String },

    /// I/O error during file operations.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Listing the repository tree failed.
    #[error(transparent)]
    Listing(#[from] IngestError),
}

impl RepositoryError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Returns whether the downloaded content failed verification.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
