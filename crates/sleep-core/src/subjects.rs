//! Subject sidecar loading.

use std::path::{Path, PathBuf};

use sleep_ingest::{RecordPattern, SubjectTable, find_files};
use sleep_repository::Repository;
use tracing::{debug, info};

use crate::dataset::{DATASETS_DIR, SubjectSidecar};
use crate::error::{PipelineError, Result};

/// Loads the subject sidecars needed for `keys`.
///
/// A sidecar is only read when at least one requested key belongs to it.
/// The first file matching a sidecar's pattern is used; online, it is
/// fetched from `repository` first.
pub fn load_sidecars(
    sidecars: &[SubjectSidecar],
    keys: &[String],
    db_dir: &Path,
    repository: Option<&dyn Repository>,
) -> Result<SubjectTable> {
    let mut subjects = SubjectTable::new();
    for sidecar in sidecars {
        if !keys.iter().any(|key| key.starts_with(sidecar.key_prefix)) {
            debug!(pattern = sidecar.pattern, "no requested record uses this sidecar");
            continue;
        }
        let path = locate_sidecar(sidecar, db_dir, repository)?;
        let table =
            SubjectTable::load(&path, &sidecar.columns).map_err(PipelineError::SubjectSidecar)?;
        info!(path = %path.display(), subjects = table.len(), "loaded subject sidecar");
        subjects.merge(table);
    }
    Ok(subjects)
}

fn locate_sidecar(
    sidecar: &SubjectSidecar,
    db_dir: &Path,
    repository: Option<&dyn Repository>,
) -> Result<PathBuf> {
    let pattern = RecordPattern::new(sidecar.pattern).map_err(PipelineError::Listing)?;
    let missing = || PipelineError::MissingSubjectSidecar {
        pattern: sidecar.pattern.to_string(),
        dir: db_dir.join(DATASETS_DIR),
    };

    if let Some(repository) = repository {
        let file = repository
            .list(DATASETS_DIR, &pattern, false)?
            .into_iter()
            .next()
            .ok_or_else(missing)?;
        let target = db_dir.join(&file.relative_path);
        repository.fetch(&file, &target)?;
        return Ok(target);
    }

    let datasets_dir = db_dir.join(DATASETS_DIR);
    let found = find_files(&datasets_dir, &pattern, false).map_err(PipelineError::Listing)?;
    found
        .into_iter()
        .next()
        .map(|relative| datasets_dir.join(relative))
        .ok_or_else(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, SubjectSource};
    use sleep_model::Gender;
    use tempfile::tempdir;

    fn shhs_sidecars() -> Vec<SubjectSidecar> {
        match Dataset::Shhs.config().subjects {
            SubjectSource::Sidecars(sidecars) => sidecars,
            SubjectSource::HeaderComment { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_only_needed_visits_are_loaded() {
        let dir = tempdir().unwrap();
        let datasets = dir.path().join(DATASETS_DIR);
        std::fs::create_dir_all(&datasets).unwrap();
        std::fs::write(
            datasets.join("shhs1-dataset-0.21.0.csv"),
            "nsrrid,gender,age_s1,weight\n200001,2,54,81.5\n200002,1,x,\n",
        )
        .unwrap();

        let keys = vec!["shhs1/shhs1-200001".to_string()];
        let mut subjects = load_sidecars(&shhs_sidecars(), &keys, dir.path(), None).unwrap();
        assert_eq!(subjects.len(), 2);

        let first = subjects.take("shhs1-200001").unwrap().unwrap();
        assert_eq!(first.gender, Some(Gender::Female));
        assert_eq!(first.age, Some(54));
        assert_eq!(first.weight, Some(81.5));

        let second = subjects.take("shhs1-200002").unwrap().unwrap();
        assert_eq!(second.age, None);
        assert_eq!(second.weight, None);
    }

    #[test]
    fn test_missing_sidecar_is_reported() {
        let dir = tempdir().unwrap();
        let keys = vec!["shhs2/shhs2-200001".to_string()];
        let err = load_sidecars(&shhs_sidecars(), &keys, dir.path(), None).unwrap_err();
        assert!(matches!(err, PipelineError::MissingSubjectSidecar { .. }));
    }
}
