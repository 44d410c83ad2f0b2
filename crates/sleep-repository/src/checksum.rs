//! SHA256 checksum computation and verification.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{RepositoryError, Result};

/// Buffer size for reading files during checksum computation.
const BUFFER_SIZE: usize = 65536; // 64 KB

/// Compute the SHA256 hash of a file as lowercase hex.
pub fn compute_file_sha256(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| RepositoryError::io("open", path, e))?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| RepositoryError::io("read", path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hex_hash = hex::encode(hasher.finalize());
    debug!(path = %path.display(), sha256 = %hex_hash, "computed checksum");
    Ok(hex_hash)
}

/// Verify that a file matches the expected SHA256 hash.
pub fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    let actual = compute_file_sha256(path)?;
    let expected = expected.trim().to_lowercase();
    if actual != expected {
        return Err(RepositoryError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Returns true if `path` exists and matches `expected`.
pub fn matches_sha256(path: &Path, expected: &str) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    match verify_sha256(path, expected) {
        Ok(()) => Ok(true),
        Err(RepositoryError::ChecksumMismatch { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Parses a `sha256sum`-style manifest into `(relative_path, checksum)` pairs.
///
/// Each line holds a hash and a path separated by whitespace; a `*` before
/// the path (binary mode) is ignored. Blank lines and `#` comments are
/// skipped.
pub fn parse_checksum_manifest(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (hash, path) = line.split_once(char::is_whitespace)?;
            let path = path.trim_start().trim_start_matches('*');
            (!path.is_empty()).then(|| (path.replace('\\', "/"), hash.to_lowercase()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HELLO_SHA256: &str = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";

    fn hello_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Hello, World!").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_compute_sha256() {
        let file = hello_file();
        assert_eq!(compute_file_sha256(file.path()).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn test_verify_sha256_is_case_insensitive() {
        let file = hello_file();
        assert!(verify_sha256(file.path(), &HELLO_SHA256.to_uppercase()).is_ok());
    }

    #[test]
    fn test_verify_sha256_failure() {
        let file = hello_file();
        let err = verify_sha256(file.path(), "0000").unwrap_err();
        assert!(err.is_integrity_failure());
        assert!(!matches_sha256(file.path(), "0000").unwrap());
    }

    #[test]
    fn test_matches_missing_file() {
        assert!(!matches_sha256(Path::new("/nonexistent/file.edf"), HELLO_SHA256).unwrap());
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = "# generated\nABC123  polysomnography/edfs/mesa-sleep-0001.edf\n\ndef456 *overlap\\mesa-actigraphy-psg-overlap.csv\n";
        let entries = parse_checksum_manifest(manifest);
        assert_eq!(
            entries,
            vec![
                (
                    "polysomnography/edfs/mesa-sleep-0001.edf".to_string(),
                    "abc123".to_string()
                ),
                (
                    "overlap/mesa-actigraphy-psg-overlap.csv".to_string(),
                    "def456".to_string()
                ),
            ]
        );
    }
}
