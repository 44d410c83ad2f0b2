//! Error types for sleep-study file ingestion.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading dataset files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Annotation Errors ===
    /// Malformed XML.
    #[error("failed to parse XML {path}: {message}")]
    Xml { path: PathBuf, message: String },

    /// A required scalar field is absent.
    #[error("{field} not found in {path}")]
    MissingField { field: &'static str, path: PathBuf },

    /// A required event is absent.
    #[error("'{event}' not found in {path}")]
    MissingEvent { event: &'static str, path: PathBuf },

    /// A staging label with no stage mapping.
    #[error("unknown sleep stage label '{label}' in {path}")]
    UnknownStage { label: String, path: PathBuf },

    /// A field holds a value that cannot be interpreted.
    #[error("invalid {field} value '{value}' in {path}")]
    InvalidValue {
        field: String,
        value: String,
        path: PathBuf,
    },

    // === Tabular Errors ===
    /// Failed to parse CSV.
    #[error("failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    /// Required column not found.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    // === Cache Errors ===
    /// Cached array has an unsupported layout.
    #[error("invalid array file {path}: {reason}")]
    InvalidArray { path: PathBuf, reason: String },

    // === Discovery Errors ===
    /// Record glob could not be compiled.
    #[error("invalid record pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl IngestError {
    /// Maps an open/read failure, distinguishing missing files.
    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::FileRead {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, value: impl Into<String>, path: &Path) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            path: path.to_path_buf(),
        }
    }

    /// Returns true if the error only says a file is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::MissingField {
            field: "EpochLength",
            path: PathBuf::from("/data/mesa-sleep-0001-nsrr.xml"),
        };
        assert_eq!(
            err.to_string(),
            "EpochLength not found in /data/mesa-sleep-0001-nsrr.xml"
        );
    }

    #[test]
    fn test_read_error_not_found() {
        let source = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = IngestError::read(Path::new("missing.csv"), source);
        assert!(err.is_not_found());
    }
}
