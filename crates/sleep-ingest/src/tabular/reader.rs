//! CSV sidecar reading with explicit encoding and column addressing.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{IngestError, Result};

/// Text encoding of a sidecar file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Legacy Windows code page used by the SHHS dataset exports.
    Windows1252,
}

/// Addresses a column either by position or by header name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(&'static str),
}

impl ColumnRef {
    /// Resolves the column against a header row.
    pub fn resolve(&self, headers: &[String], path: &Path) -> Result<usize> {
        match *self {
            ColumnRef::Index(index) if index < headers.len() || headers.is_empty() => Ok(index),
            ColumnRef::Index(index) => Err(IngestError::MissingColumn {
                column: format!("#{index}"),
                path: path.to_path_buf(),
            }),
            ColumnRef::Name(name) => headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| IngestError::MissingColumn {
                    column: name.to_string(),
                    path: path.to_path_buf(),
                }),
        }
    }
}

/// A fully loaded CSV file with one header row.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Returns the trimmed cell or `""` when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn csv_error(path: &Path, error: &csv::Error) -> IngestError {
    IngestError::Csv {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

/// Reads a whole CSV file, decoding it from `encoding` first.
///
/// The first row is the header. Rows may be ragged; missing cells read as
/// empty strings through [`CsvTable::cell`].
pub fn read_csv_table(path: &Path, encoding: TextEncoding) -> Result<CsvTable> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::read(path, e))?;
    let text = match encoding {
        TextEncoding::Utf8 => String::from_utf8_lossy(&bytes).into_owned(),
        TextEncoding::Windows1252 => {
            let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(&bytes);
            if had_errors {
                tracing::warn!(path = %path.display(), "replaced undecodable bytes");
            }
            decoded.into_owned()
        }
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, &e))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, &e))?;
        let row: Vec<String> = record.iter().map(normalize_cell).collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        rows.push(row);
    }
    Ok(CsvTable { headers, rows })
}

/// Streams one numeric column of a CSV file with a single header row.
///
/// Used for large per-record sidecars where only a single column matters.
pub fn read_f64_column(path: &Path, column: ColumnRef) -> Result<Vec<f64>> {
    let file = File::open(path).map_err(|e| IngestError::read(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, &e))?
        .iter()
        .map(normalize_header)
        .collect();
    let index = column.resolve(&headers, path)?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, &e))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let raw = record.get(index).map(str::trim).unwrap_or("");
        let value = raw
            .parse::<f64>()
            .map_err(|_| IngestError::invalid(column_label(column, &headers), raw, path))?;
        values.push(value);
    }
    Ok(values)
}

fn column_label(column: ColumnRef, headers: &[String]) -> String {
    match column {
        ColumnRef::Index(index) => headers
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("column {index}")),
        ColumnRef::Name(name) => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_read_table_trims_bom_and_cells() {
        let file = create_temp_csv("\u{feff}id, name \n 1 , a \n\n2,b\n".as_bytes());
        let table = read_csv_table(file.path(), TextEncoding::Utf8).unwrap();

        assert_eq!(table.headers, vec!["id", "name"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), "1");
        assert_eq!(table.cell(0, 1), "a");
        assert_eq!(table.cell(1, 5), "");
    }

    #[test]
    fn test_read_table_windows_1252() {
        // 0xE8 is 'è' in Windows-1252 and invalid as a lone UTF-8 byte.
        let file = create_temp_csv(b"site,city\n1,Gen\xE8ve\n");
        let table = read_csv_table(file.path(), TextEncoding::Windows1252).unwrap();
        assert_eq!(table.cell(0, 1), "Gen\u{e8}ve");
    }

    #[test]
    fn test_column_ref_by_name() {
        let headers = vec!["mesaid".to_string(), "line".to_string()];
        let path = Path::new("overlap.csv");
        assert_eq!(ColumnRef::Name("line").resolve(&headers, path).unwrap(), 1);
        assert!(matches!(
            ColumnRef::Name("activity").resolve(&headers, path),
            Err(IngestError::MissingColumn { .. })
        ));
        assert!(ColumnRef::Index(2).resolve(&headers, path).is_err());
    }

    #[test]
    fn test_read_f64_column_by_index() {
        let file = create_temp_csv(b"epoch,seconds\n1,5.0\n2,2.0\n3,3.5\n");
        let values = read_f64_column(file.path(), ColumnRef::Index(1)).unwrap();
        assert_eq!(values, vec![5.0, 2.0, 3.5]);
    }

    #[test]
    fn test_read_f64_column_rejects_text() {
        let file = create_temp_csv(b"epoch,seconds\n1,abc\n");
        let result = read_f64_column(file.path(), ColumnRef::Name("seconds"));
        assert!(matches!(result, Err(IngestError::InvalidValue { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = read_csv_table(Path::new("/nonexistent/file.csv"), TextEncoding::Utf8);
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }
}
