//! Local file resolution for one record.

use std::path::PathBuf;

use sleep_repository::{RemoteFile, Repository, RepositoryError};
use tracing::debug;

use crate::dataset::RecordPaths;

/// A record's file paths plus the repository to fetch missing files from.
///
/// Without a repository (offline mode) only files already on disk are used.
#[derive(Clone, Copy)]
pub struct RecordFiles<'a> {
    paths: RecordPaths<'a>,
    repository: Option<&'a dyn Repository>,
}

impl<'a> RecordFiles<'a> {
    pub fn new(paths: RecordPaths<'a>, repository: Option<&'a dyn Repository>) -> Self {
        Self { paths, repository }
    }

    pub fn paths(&self) -> &RecordPaths<'a> {
        &self.paths
    }

    /// Returns the local path of `relative`, fetching it first when online.
    ///
    /// `Ok(None)` means the file is neither on disk nor offered by the
    /// repository.
    pub fn obtain(&self, relative: &str) -> Result<Option<PathBuf>, RepositoryError> {
        let local = self.paths.local(relative);
        let Some(repository) = self.repository else {
            return Ok(local.is_file().then_some(local));
        };
        match repository.fetch_path(relative, &local) {
            Ok(()) => Ok(Some(local)),
            Err(RepositoryError::NotFound { .. }) if local.is_file() => {
                debug!(file = relative, "not offered by repository, using local copy");
                Ok(Some(local))
            }
            Err(RepositoryError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetches a file already known from a listing.
    pub fn fetch(&self, file: &RemoteFile) -> Result<PathBuf, RepositoryError> {
        let local = self.paths.local(&file.relative_path);
        if let Some(repository) = self.repository {
            repository.fetch(file, &local)?;
        }
        Ok(local)
    }
}
