//! Annotated R-point (heartbeat) sidecars.

use std::path::Path;

use crate::error::Result;
use crate::tabular::{ColumnRef, read_f64_column};

/// Reads heartbeat times in seconds from an R-point sidecar.
///
/// Some sidecars list beats out of order, so the result is always sorted
/// ascending.
pub fn read_rpoint_times(path: &Path, column: ColumnRef) -> Result<Vec<f64>> {
    let mut times = read_f64_column(path, column)?;
    let was_sorted = times.is_sorted();
    times.sort_by(f64::total_cmp);
    if !was_sorted {
        tracing::debug!(path = %path.display(), "sorted out-of-order heartbeat annotations");
    }
    Ok(times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_times_are_sorted() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"RPoint,seconds\n1,5.0\n2,2.0\n3,3.0\n").unwrap();
        let times = read_rpoint_times(file.path(), ColumnRef::Index(1)).unwrap();
        assert_eq!(times, vec![2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_missing_sidecar() {
        let err = read_rpoint_times(Path::new("/nonexistent/x-rpoint.csv"), ColumnRef::Index(18))
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
