//! A repository served from a local directory tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use sleep_ingest::{RecordPattern, find_files};
use tracing::{debug, info};

use crate::checksum::{compute_file_sha256, matches_sha256, parse_checksum_manifest, verify_sha256};
use crate::error::{RepositoryError, Result};
use crate::{RemoteFile, Repository};

/// Name of the optional checksum manifest at the mirror root.
pub const MANIFEST_FILE: &str = "SHA256SUMS";

/// Serves files from a directory that mirrors a dataset's remote layout,
/// such as a network share or a previously synced copy.
///
/// Checksums come from a `SHA256SUMS` manifest at the root when present;
/// files the manifest does not cover are hashed on listing.
#[derive(Debug, Clone)]
pub struct MirrorRepository {
    root: PathBuf,
    manifest: BTreeMap<String, String>,
}

impl MirrorRepository {
    /// Opens the mirror rooted at `root`, loading its manifest if present.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(RepositoryError::io(
                "open mirror",
                &root,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = if manifest_path.is_file() {
            let content = fs::read_to_string(&manifest_path)
                .map_err(|e| RepositoryError::io("read", &manifest_path, e))?;
            parse_checksum_manifest(&content).into_iter().collect()
        } else {
            BTreeMap::new()
        };
        info!(
            root = %root.display(),
            manifest_entries = manifest.len(),
            "opened mirror repository"
        );
        Ok(Self { root, manifest })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn source_path(&self, relative_path: &str) -> Result<PathBuf> {
        let relative = Path::new(relative_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(RepositoryError::InvalidPath {
                relative_path: relative_path.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    fn checksum_of(&self, relative_path: &str, source: &Path) -> Result<String> {
        match self.manifest.get(relative_path) {
            Some(checksum) => Ok(checksum.clone()),
            None => compute_file_sha256(source),
        }
    }
}

fn join_relative(subdir: &str, relative: &Path) -> String {
    let tail = relative.to_string_lossy().replace('\\', "/");
    let subdir = subdir.trim_matches('/');
    if subdir.is_empty() {
        tail
    } else {
        format!("{subdir}/{tail}")
    }
}

impl Repository for MirrorRepository {
    fn list(&self, subdir: &str, pattern: &RecordPattern, recursive: bool) -> Result<Vec<RemoteFile>> {
        let dir = self.source_path(subdir)?;
        let mut files = Vec::new();
        for relative in find_files(&dir, pattern, recursive)? {
            let relative_path = join_relative(subdir, &relative);
            let checksum = self.checksum_of(&relative_path, &dir.join(&relative))?;
            files.push(RemoteFile {
                relative_path,
                checksum,
            });
        }
        debug!(
            subdir,
            pattern = pattern.as_str(),
            files = files.len(),
            "listed mirror files"
        );
        Ok(files)
    }

    fn fetch(&self, file: &RemoteFile, target: &Path) -> Result<()> {
        if matches_sha256(target, &file.checksum)? {
            debug!(path = %target.display(), "file already present");
            return Ok(());
        }

        let source = self.source_path(&file.relative_path)?;
        if !source.is_file() {
            return Err(RepositoryError::NotFound {
                relative_path: file.relative_path.clone(),
            });
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RepositoryError::io("create directory", parent, e))?;
        }

        let mut temp_name = target.as_os_str().to_os_string();
        temp_name.push(".part");
        let temp_path = PathBuf::from(temp_name);
        fs::copy(&source, &temp_path).map_err(|e| RepositoryError::io("copy", &source, e))?;

        if let Err(e) = verify_sha256(&temp_path, &file.checksum) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        fs::rename(&temp_path, target).map_err(|e| RepositoryError::io("rename", &temp_path, e))?;
        info!(file = %file.relative_path, path = %target.display(), "fetched file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_relative() {
        assert_eq!(
            join_relative("polysomnography/edfs/", Path::new("shhs1/shhs1-200001.edf")),
            "polysomnography/edfs/shhs1/shhs1-200001.edf"
        );
        assert_eq!(join_relative("", Path::new("slp01a.hea")), "slp01a.hea");
    }

    #[test]
    fn test_rejects_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let repository = MirrorRepository::open(dir.path()).unwrap();
        assert!(matches!(
            repository.source_path("../secret"),
            Err(RepositoryError::InvalidPath { .. })
        ));
        assert!(repository.source_path("a/./b.csv").is_ok());
    }
}
