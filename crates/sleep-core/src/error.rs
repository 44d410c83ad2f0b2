//! Error types for record assembly.
//!
//! [`PipelineError`] covers failures while a reader is being set up and is
//! returned to the caller. [`SkipReason`] is the terminal state of a single
//! record that could not be assembled; it is logged and the reader moves on.

use std::path::PathBuf;

use sleep_ingest::IngestError;
use sleep_model::ConfigurationError;
use sleep_repository::RepositoryError;
use thiserror::Error;

use crate::signal::SignalError;

/// Errors that prevent a reader from starting.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid reader arguments.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Listing the requested records failed.
    #[error("failed to list records: {0}")]
    Listing(#[source] IngestError),

    /// The repository could not list or provide a required file.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// No subject sidecar matched the dataset's pattern.
    #[error("no subject sidecar matching {pattern} in {dir}")]
    MissingSubjectSidecar { pattern: String, dir: PathBuf },

    /// A subject sidecar could not be read.
    #[error("failed to load subject sidecar: {0}")]
    SubjectSidecar(#[source] IngestError),

    /// The actigraphy overlap table is required but absent.
    #[error("actigraphy overlap table not found: {path}")]
    MissingOverlapTable { path: PathBuf },

    /// The actigraphy overlap table could not be read.
    #[error("failed to load overlap table: {0}")]
    OverlapTable(#[source] IngestError),

    /// A dataset or cache directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings could not be written.
    #[error("failed to save settings to {path}: {message}")]
    SettingsWrite { path: PathBuf, message: String },
}

/// Result type for reader set-up.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Why a record was not emitted.
#[derive(Debug, Error)]
pub enum SkipReason {
    /// The annotated heartbeat sidecar is absent.
    #[error("missing heartbeat annotations")]
    MissingHeartbeats,

    /// Cached heartbeat mode, but no cached array exists.
    #[error("missing cached heartbeats")]
    MissingCachedHeartbeats,

    /// The subject has no entry in the actigraphy overlap table.
    #[error("missing overlap data")]
    MissingOverlap,

    /// The subject's actigraphy export is absent.
    #[error("missing activity data")]
    MissingActivityData,

    /// Cached activity mode, but no cached array exists.
    #[error("missing cached activity counts")]
    MissingCachedActivity,

    /// No actigraphy row carries the rounded end-of-recording clock label.
    #[error("missing line matching {label}")]
    MissingBoundaryRow { label: String },

    /// The aligned actigraphy differs from the stage count by more than the
    /// tolerated number of epochs.
    #[error("invalid activity counts: {candidate} counts for {expected} epochs")]
    ActivityLengthMismatch { candidate: usize, expected: usize },

    /// A required file is malformed.
    #[error(transparent)]
    Format(#[from] IngestError),

    /// A required file could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] RepositoryError),

    /// Signal decoding or heartbeat detection failed.
    #[error(transparent)]
    Decode(#[from] SignalError),

    /// A computed array could not be persisted.
    #[error("failed to write cache: {0}")]
    Cache(#[source] IngestError),

    /// The dataset lists the record but has no subject row for it.
    #[error("no subject data for this record")]
    MissingSubjectData,
}

impl SkipReason {
    /// Returns true when the skip indicates an inconsistent dataset rather
    /// than merely unavailable data.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::MissingSubjectData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::MissingBoundaryRow {
            label: "6:12:30".to_string(),
        };
        assert_eq!(reason.to_string(), "missing line matching 6:12:30");

        let reason = SkipReason::ActivityLengthMismatch {
            candidate: 1000,
            expected: 996,
        };
        assert_eq!(
            reason.to_string(),
            "invalid activity counts: 1000 counts for 996 epochs"
        );
    }

    #[test]
    fn test_integrity_violation() {
        assert!(SkipReason::MissingSubjectData.is_integrity_violation());
        assert!(!SkipReason::MissingOverlap.is_integrity_violation());
    }
}
