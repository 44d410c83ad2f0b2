//! Tests for the directory-backed repository.

use std::fs;
use std::path::Path;

use sleep_ingest::RecordPattern;
use sleep_repository::{
    MANIFEST_FILE, MirrorRepository, RemoteFile, Repository, RepositoryError, compute_file_sha256,
};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn shhs_mirror() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "polysomnography/annotations-events-nsrr/shhs1/shhs1-200001-nsrr.xml", "a");
    write(root, "polysomnography/annotations-events-nsrr/shhs1/shhs1-200002-nsrr.xml", "b");
    write(root, "polysomnography/annotations-events-nsrr/shhs2/shhs2-200001-nsrr.xml", "c");
    write(root, "polysomnography/annotations-events-nsrr/shhs2/shhs2-200001-profusion.xml", "d");
    dir
}

#[test]
fn test_lists_recursively_with_checksums() {
    let mirror = shhs_mirror();
    let repository = MirrorRepository::open(mirror.path()).unwrap();
    let pattern = RecordPattern::with_affixes("", "shhs1-*", "-nsrr.xml").unwrap();

    let files = repository
        .list("polysomnography/annotations-events-nsrr", &pattern, true)
        .unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "polysomnography/annotations-events-nsrr/shhs1/shhs1-200001-nsrr.xml",
            "polysomnography/annotations-events-nsrr/shhs1/shhs1-200002-nsrr.xml",
        ]
    );
    assert_eq!(files[0].file_name(), "shhs1-200001-nsrr.xml");
    assert_eq!(
        files[0].checksum,
        compute_file_sha256(&mirror.path().join(&files[0].relative_path)).unwrap()
    );
}

#[test]
fn test_manifest_checksums_take_precedence() {
    let mirror = shhs_mirror();
    fs::write(
        mirror.path().join(MANIFEST_FILE),
        "abc  polysomnography/annotations-events-nsrr/shhs1/shhs1-200001-nsrr.xml\n",
    )
    .unwrap();
    let repository = MirrorRepository::open(mirror.path()).unwrap();

    let file = repository
        .lookup("polysomnography/annotations-events-nsrr/shhs1/shhs1-200001-nsrr.xml")
        .unwrap()
        .unwrap();
    assert_eq!(file.checksum, "abc");

    let other = repository
        .lookup("polysomnography/annotations-events-nsrr/shhs1/shhs1-200002-nsrr.xml")
        .unwrap()
        .unwrap();
    assert_eq!(other.checksum.len(), 64);
}

#[test]
fn test_fetch_copies_and_verifies() {
    let mirror = shhs_mirror();
    let local = TempDir::new().unwrap();
    let repository = MirrorRepository::open(mirror.path()).unwrap();
    let relative = "polysomnography/annotations-events-nsrr/shhs2/shhs2-200001-nsrr.xml";
    let target = local.path().join(relative);

    repository.fetch_path(relative, &target).unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "c");

    // A second fetch finds matching content and leaves the file alone.
    repository.fetch_path(relative, &target).unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "c");
}

#[test]
fn test_fetch_rejects_checksum_mismatch() {
    let mirror = shhs_mirror();
    let local = TempDir::new().unwrap();
    let repository = MirrorRepository::open(mirror.path()).unwrap();
    let file = RemoteFile {
        relative_path: "polysomnography/annotations-events-nsrr/shhs1/shhs1-200001-nsrr.xml"
            .to_string(),
        checksum: "0".repeat(64),
    };
    let target = local.path().join("shhs1-200001-nsrr.xml");

    let err = repository.fetch(&file, &target).unwrap_err();
    assert!(err.is_integrity_failure());
    assert!(!target.exists());
    assert!(!local.path().join("shhs1-200001-nsrr.xml.part").exists());
}

#[test]
fn test_fetch_missing_file() {
    let mirror = shhs_mirror();
    let local = TempDir::new().unwrap();
    let repository = MirrorRepository::open(mirror.path()).unwrap();
    let err = repository
        .fetch_path("polysomnography/edfs/shhs1/shhs1-200001.edf", &local.path().join("x.edf"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[test]
fn test_open_missing_root() {
    let err = MirrorRepository::open("/nonexistent/mirror").unwrap_err();
    assert!(matches!(err, RepositoryError::Io { .. }));
}
