//! Record discovery with shell-style glob patterns.
//!
//! Patterns follow the usual file-name glob rules: `*` matches any run of
//! characters, `?` a single character, and `[...]` / `[!...]` a character
//! class. Wildcards never match a path separator; recursive discovery
//! matches the pattern against the file name and reports the path relative
//! to the searched root.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::{IngestError, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled file-name glob.
#[derive(Debug, Clone)]
pub struct RecordPattern {
    glob: String,
    pattern: Pattern,
}

impl RecordPattern {
    /// Compiles `glob` into a matcher over whole file names.
    pub fn new(glob: &str) -> Result<Self> {
        Ok(Self {
            glob: glob.to_string(),
            pattern: compile(glob)?,
        })
    }

    /// Matches the record glob wrapped between a fixed file prefix and suffix,
    /// e.g. `mesa-sleep-` + `00*` + `-nsrr.xml`.
    pub fn with_affixes(prefix: &str, glob: &str, suffix: &str) -> Result<Self> {
        let full = format!("{}{glob}{}", Pattern::escape(prefix), Pattern::escape(suffix));
        Ok(Self {
            glob: glob.to_string(),
            pattern: compile(&full)?,
        })
    }

    /// Matches exactly `name`.
    pub fn literal(name: &str) -> Result<Self> {
        Ok(Self {
            glob: name.to_string(),
            pattern: compile(&Pattern::escape(name))?,
        })
    }

    /// The glob as given by the caller.
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.pattern.matches_with(name, MATCH_OPTIONS)
    }
}

fn compile(glob: &str) -> Result<Pattern> {
    Pattern::new(glob).map_err(|e| IngestError::InvalidPattern {
        pattern: glob.to_string(),
        message: e.to_string(),
    })
}

/// Lists files below `root` whose name matches `pattern`.
///
/// Returned paths are relative to `root` and sorted. A missing `root` yields
/// an empty list.
pub fn find_files(root: &Path, pattern: &RecordPattern, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if root.is_dir() {
        walk(root, Path::new(""), pattern, recursive, &mut found)?;
    } else {
        tracing::debug!(path = %root.display(), "search directory does not exist");
    }
    found.sort();
    Ok(found)
}

fn walk(
    dir: &Path,
    relative: &Path,
    pattern: &RecordPattern,
    recursive: bool,
    found: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if path.is_dir() {
            if recursive {
                walk(&path, &relative.join(name.as_ref()), pattern, recursive, found)?;
            }
        } else if pattern.is_match(&name) {
            found.push(relative.join(name.as_ref()));
        }
    }
    Ok(())
}

/// Strips `suffix` from a relative file path, producing a record key such as
/// `shhs1/shhs1-200001` from `shhs1/shhs1-200001-nsrr.xml`.
pub fn record_key(relative: &Path, suffix: &str) -> Option<String> {
    let text = relative.to_str()?.replace('\\', "/");
    text.strip_suffix(suffix).map(str::to_string)
}

/// The file-name part of a record key.
pub fn key_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_star_and_question_mark() {
        let pattern = RecordPattern::new("mesa-sleep-00?1*").unwrap();
        assert!(pattern.is_match("mesa-sleep-0001-nsrr.xml"));
        assert!(pattern.is_match("mesa-sleep-0091"));
        assert!(!pattern.is_match("mesa-sleep-0010"));
        assert!(!pattern.is_match("x/mesa-sleep-0001"));
    }

    #[test]
    fn test_character_classes() {
        let pattern = RecordPattern::new("slp[0-3][!a]").unwrap();
        assert!(pattern.is_match("slp01"));
        assert!(!pattern.is_match("slp0a"));
        assert!(!pattern.is_match("slp41"));

        let err = RecordPattern::new("a[b").unwrap_err();
        assert!(matches!(err, IngestError::InvalidPattern { .. }));
    }

    #[test]
    fn test_non_glob_characters_are_literal() {
        let pattern = RecordPattern::new("a.b+c").unwrap();
        assert!(pattern.is_match("a.b+c"));
        assert!(!pattern.is_match("axbbc"));
    }

    #[test]
    fn test_affixes() {
        let pattern = RecordPattern::with_affixes("mesa-sleep-", "*", "-nsrr.xml").unwrap();
        assert_eq!(pattern.as_str(), "*");
        assert!(!pattern.is_match("shhs1/mesa-sleep-0001-nsrr.xml"));
        assert!(pattern.is_match("mesa-sleep-0001-nsrr.xml"));
        assert!(!pattern.is_match("mesa-sleep-0001-profusion.xml"));
    }

    #[test]
    fn test_literal() {
        let pattern = RecordPattern::literal("a*[1].csv").unwrap();
        assert!(pattern.is_match("a*[1].csv"));
        assert!(!pattern.is_match("ab[1].csv"));
    }

    #[test]
    fn test_find_files_recursive() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("shhs1")).unwrap();
        std::fs::create_dir_all(dir.path().join("shhs2")).unwrap();
        for name in [
            "shhs1/shhs1-200002-nsrr.xml",
            "shhs1/shhs1-200001-nsrr.xml",
            "shhs2/shhs2-200001-nsrr.xml",
            "shhs2/notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let pattern = RecordPattern::with_affixes("", "*", "-nsrr.xml").unwrap();
        let files = find_files(dir.path(), &pattern, true).unwrap();
        let keys: Vec<String> = files
            .iter()
            .filter_map(|p| record_key(p, "-nsrr.xml"))
            .collect();
        assert_eq!(
            keys,
            vec!["shhs1/shhs1-200001", "shhs1/shhs1-200002", "shhs2/shhs2-200001"]
        );

        let shallow = find_files(dir.path(), &pattern, false).unwrap();
        assert!(shallow.is_empty());
    }

    #[test]
    fn test_find_files_missing_root() {
        let pattern = RecordPattern::new("*").unwrap();
        let files = find_files(Path::new("/nonexistent/dir"), &pattern, false).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_key_name() {
        assert_eq!(key_name("shhs1/shhs1-200001"), "shhs1-200001");
        assert_eq!(key_name("mesa-sleep-0001"), "mesa-sleep-0001");
    }
}
