//! Dataset file repositories.
//!
//! A [`Repository`] lists the files of a remote dataset with their checksums
//! and retrieves them into the local data directory, verifying content on
//! arrival. The record pipeline only talks to this trait; offline reads never
//! touch a repository at all.

mod checksum;
mod error;
mod mirror;

use std::path::Path;

use sleep_ingest::RecordPattern;

pub use checksum::{compute_file_sha256, matches_sha256, parse_checksum_manifest, verify_sha256};
pub use error::{RepositoryError, Result};
pub use mirror::{MANIFEST_FILE, MirrorRepository};

/// A file offered by a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// `/`-separated path relative to the dataset root.
    pub relative_path: String,
    /// Lowercase hex SHA256 of the file content.
    pub checksum: String,
}

impl RemoteFile {
    /// The last path component.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}

/// Source of dataset files.
pub trait Repository {
    /// Lists files below `subdir` whose name matches `pattern`, descending into
    /// subdirectories when `recursive` is set.
    fn list(&self, subdir: &str, pattern: &RecordPattern, recursive: bool) -> Result<Vec<RemoteFile>>;

    /// Ensures `target` holds the content of `file`, retrieving it if needed.
    fn fetch(&self, file: &RemoteFile, target: &Path) -> Result<()>;

    /// Looks up a single file by its relative path.
    fn lookup(&self, relative_path: &str) -> Result<Option<RemoteFile>> {
        let (subdir, name) = relative_path.rsplit_once('/').unwrap_or(("", relative_path));
        let pattern = RecordPattern::literal(name)?;
        Ok(self.list(subdir, &pattern, false)?.into_iter().next())
    }

    /// Looks up `relative_path` and fetches it into `target`.
    fn fetch_path(&self, relative_path: &str, target: &Path) -> Result<()> {
        let file = self
            .lookup(relative_path)?
            .ok_or_else(|| RepositoryError::NotFound {
                relative_path: relative_path.to_string(),
            })?;
        self.fetch(&file, target)
    }
}
