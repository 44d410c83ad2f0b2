//! Actigraphy sidecars: the per-minute activity export and the overlap table
//! that anchors it to the polysomnography clock.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::tabular::{ColumnRef, TextEncoding, read_csv_table};

/// Maps a subject's numeric id to the actigraphy line where the
/// polysomnography recording starts.
#[derive(Debug, Clone, Default)]
pub struct OverlapTable {
    lines: BTreeMap<u64, usize>,
}

impl OverlapTable {
    /// Loads an overlap table with the given id and line columns.
    pub fn load(path: &Path, id_column: &'static str, line_column: &'static str) -> Result<Self> {
        let table = read_csv_table(path, TextEncoding::Utf8)?;
        let id_col = ColumnRef::Name(id_column).resolve(&table.headers, path)?;
        let line_col = ColumnRef::Name(line_column).resolve(&table.headers, path)?;

        let mut lines = BTreeMap::new();
        for row in 0..table.len() {
            let id = table.cell(row, id_col);
            let line = table.cell(row, line_col);
            let id = id
                .parse::<u64>()
                .map_err(|_| IngestError::invalid(id_column, id, path))?;
            let line = line
                .parse::<usize>()
                .map_err(|_| IngestError::invalid(line_column, line, path))?;
            lines.insert(id, line);
        }
        tracing::debug!(path = %path.display(), subjects = lines.len(), "loaded overlap table");
        Ok(Self { lines })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (u64, usize)>) -> Self {
        Self {
            lines: entries.into_iter().collect(),
        }
    }

    /// Starting line for `subject`, if the table has one.
    pub fn start_line(&self, subject: u64) -> Option<usize> {
        self.lines.get(&subject).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// One minute (or epoch) row of an actigraphy export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActigraphyRow {
    /// Value of the `line` column, kept as text until it is needed.
    pub line: String,
    /// Clock-of-day label such as `"3:05:00"`.
    pub linetime: String,
    /// Activity count; blank when the device recorded nothing.
    pub activity: String,
}

/// A subject's actigraphy export in file order.
#[derive(Debug, Clone, Default)]
pub struct ActigraphyTable {
    pub rows: Vec<ActigraphyRow>,
}

impl ActigraphyTable {
    /// Loads the `line`, `linetime` and `activity` columns.
    pub fn load(path: &Path) -> Result<Self> {
        let table = read_csv_table(path, TextEncoding::Utf8)?;
        let line_col = ColumnRef::Name("line").resolve(&table.headers, path)?;
        let time_col = ColumnRef::Name("linetime").resolve(&table.headers, path)?;
        let activity_col = ColumnRef::Name("activity").resolve(&table.headers, path)?;

        let rows = (0..table.len())
            .map(|row| ActigraphyRow {
                line: table.cell(row, line_col).to_string(),
                linetime: table.cell(row, time_col).to_string(),
                activity: table.cell(row, activity_col).to_string(),
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_overlap_table() {
        let file = write_csv("mesaid,line,linetime,starttime_psg\n1,100,20:30:00,20:30:00\n6,2,,\n");
        let table = OverlapTable::load(file.path(), "mesaid", "line").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.start_line(1), Some(100));
        assert_eq!(table.start_line(6), Some(2));
        assert_eq!(table.start_line(2), None);
    }

    #[test]
    fn test_overlap_table_rejects_bad_line() {
        let file = write_csv("mesaid,line\n1,abc\n");
        let err = OverlapTable::load(file.path(), "mesaid", "line").unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { .. }));
    }

    #[test]
    fn test_actigraphy_table_keeps_blank_activity() {
        let file = write_csv(
            "mesaid,line,linetime,activity,marker\n1,1,20:30:00,12,0\n1,2,20:30:30,,0\n",
        );
        let table = ActigraphyTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].activity, "12");
        assert_eq!(table.rows[1].activity, "");
        assert_eq!(table.rows[1].linetime, "20:30:30");
    }
}
