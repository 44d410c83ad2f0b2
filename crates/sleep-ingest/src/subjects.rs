//! Subject demographics from tabular sidecars and WFDB header comments.
//!
//! Every field of [`SubjectData`] is independently optional: blank cells and
//! the unknown marker `x` resolve to `None`, never to zero. A row whose
//! values cannot be interpreted is kept as an error for that record only, so
//! one malformed row never prevents the rest of the table from loading.

use std::collections::BTreeMap;
use std::path::Path;

use sleep_model::{Gender, SubjectData};

use crate::error::{IngestError, Result};
use crate::tabular::{ColumnRef, TextEncoding, read_csv_table};

/// Marker used by several datasets for "not recorded".
pub const UNKNOWN_MARKER: &str = "x";

/// Maps dataset-specific gender codes to [`Gender`].
///
/// Codes match exactly after trimming; anything else is unmapped.
#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    codes: BTreeMap<&'static str, Gender>,
}

impl CodeTable {
    /// Returns `None` for codes the table does not know.
    pub fn lookup(&self, raw: &str) -> Option<Gender> {
        self.codes.get(raw.trim()).copied()
    }
}

impl FromIterator<(&'static str, Gender)> for CodeTable {
    fn from_iter<I: IntoIterator<Item = (&'static str, Gender)>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().collect(),
        }
    }
}

/// How a sidecar's subject id becomes a record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordIdFormat {
    pub prefix: &'static str,
    /// Zero-pad the numeric id to this many digits; `0` keeps the raw text.
    pub zero_pad: usize,
}

impl RecordIdFormat {
    pub fn format(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if self.zero_pad == 0 {
            return Some(format!("{}{raw}", self.prefix));
        }
        let number = parse_whole_number(raw)?;
        Some(format!("{}{number:0width$}", self.prefix, width = self.zero_pad))
    }
}

/// Column layout of a subject sidecar.
#[derive(Debug, Clone)]
pub struct SubjectColumns {
    pub id: ColumnRef,
    pub id_format: RecordIdFormat,
    pub gender: Option<ColumnRef>,
    pub age: Option<ColumnRef>,
    pub weight: Option<ColumnRef>,
    pub genders: CodeTable,
    pub encoding: TextEncoding,
}

/// Subject rows keyed by record id.
#[derive(Debug, Default)]
pub struct SubjectTable {
    rows: BTreeMap<String, Result<SubjectData>>,
}

impl SubjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a sidecar according to `columns`.
    ///
    /// Fails only when the file cannot be read or a configured column is
    /// absent. Malformed values are recorded per row.
    pub fn load(path: &Path, columns: &SubjectColumns) -> Result<Self> {
        let table = read_csv_table(path, columns.encoding)?;
        let id_col = columns.id.resolve(&table.headers, path)?;
        let gender_col = columns
            .gender
            .map(|c| c.resolve(&table.headers, path))
            .transpose()?;
        let age_col = columns
            .age
            .map(|c| c.resolve(&table.headers, path))
            .transpose()?;
        let weight_col = columns
            .weight
            .map(|c| c.resolve(&table.headers, path))
            .transpose()?;

        let mut subjects = Self::new();
        for row in 0..table.len() {
            let raw_id = table.cell(row, id_col);
            let Some(record_id) = columns.id_format.format(raw_id) else {
                tracing::warn!(
                    path = %path.display(),
                    row = row + 1,
                    value = raw_id,
                    "skipping subject row with unusable id"
                );
                continue;
            };

            let gender = gender_col.and_then(|c| columns.genders.lookup(table.cell(row, c)));
            let age = age_col.map(|c| table.cell(row, c)).unwrap_or("");
            let weight = weight_col.map(|c| table.cell(row, c)).unwrap_or("");
            let parsed = parse_row(gender, age, weight, path);
            subjects.rows.insert(record_id, parsed);
        }

        tracing::debug!(
            path = %path.display(),
            subjects = subjects.len(),
            "loaded subject sidecar"
        );
        Ok(subjects)
    }

    /// Adds the rows of `other`, replacing duplicates.
    pub fn merge(&mut self, other: SubjectTable) {
        self.rows.extend(other.rows);
    }

    /// Returns the row for `record_id`, or `None` when the table has no row.
    pub fn get(&self, record_id: &str) -> Option<&Result<SubjectData>> {
        self.rows.get(record_id)
    }

    /// Removes and returns the row for `record_id`.
    pub fn take(&mut self, record_id: &str) -> Option<Result<SubjectData>> {
        self.rows.remove(record_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_row(gender: Option<Gender>, age: &str, weight: &str, path: &Path) -> Result<SubjectData> {
    Ok(SubjectData {
        gender,
        age: parse_age(age, path)?,
        weight: parse_weight(weight, path)?,
    })
}

fn is_absent(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw.eq_ignore_ascii_case(UNKNOWN_MARKER)
}

fn parse_whole_number(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().or_else(|| {
        let value = raw.parse::<f64>().ok()?;
        (value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64).then_some(value as u64)
    })
}

/// Parses an age in whole years; absent values yield `Ok(None)`.
pub fn parse_age(raw: &str, path: &Path) -> Result<Option<u32>> {
    if is_absent(raw) {
        return Ok(None);
    }
    let raw = raw.trim();
    parse_whole_number(raw)
        .and_then(|value| u32::try_from(value).ok())
        .map(Some)
        .ok_or_else(|| IngestError::invalid("age", raw, path))
}

/// Parses a weight in kilograms; absent values yield `Ok(None)`.
pub fn parse_weight(raw: &str, path: &Path) -> Result<Option<f64>> {
    if is_absent(raw) {
        return Ok(None);
    }
    let raw = raw.trim();
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Some)
        .ok_or_else(|| IngestError::invalid("weight", raw, path))
}

/// Parses a header comment of the form `<age> <gender> <weight> <other>`,
/// e.g. `"44 M 89 32-01-89"`.
pub fn parse_subject_comment(comment: &str, genders: &CodeTable, path: &Path) -> Result<SubjectData> {
    let fields: Vec<&str> = comment.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(IngestError::invalid("subject comment", comment, path));
    }
    Ok(SubjectData {
        age: parse_age(fields[0], path)?,
        gender: genders.lookup(fields[1]),
        weight: parse_weight(fields[2], path)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn mesa_columns() -> SubjectColumns {
        SubjectColumns {
            id: ColumnRef::Index(0),
            id_format: RecordIdFormat {
                prefix: "mesa-sleep-",
                zero_pad: 4,
            },
            gender: Some(ColumnRef::Index(3)),
            age: Some(ColumnRef::Index(5)),
            weight: None,
            genders: [("0", Gender::Female), ("1", Gender::Male)]
                .into_iter()
                .collect(),
            encoding: TextEncoding::Utf8,
        }
    }

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_code_table_lookup() {
        let table: CodeTable = [("1", Gender::Male), ("F", Gender::Female)]
            .into_iter()
            .collect();
        assert_eq!(table.lookup("1"), Some(Gender::Male));
        assert_eq!(table.lookup(" 1 "), Some(Gender::Male));
        assert_eq!(table.lookup("F"), Some(Gender::Female));
        assert_eq!(table.lookup("1.0"), None);
        assert_eq!(table.lookup("f"), None);
        assert_eq!(table.lookup("3"), None);
    }

    #[test]
    fn test_record_id_format() {
        let mesa = RecordIdFormat {
            prefix: "mesa-sleep-",
            zero_pad: 4,
        };
        assert_eq!(mesa.format("1").as_deref(), Some("mesa-sleep-0001"));
        assert_eq!(mesa.format("12.0").as_deref(), Some("mesa-sleep-0012"));
        assert_eq!(mesa.format(""), None);
        assert_eq!(mesa.format("abc"), None);

        let shhs = RecordIdFormat {
            prefix: "shhs1-",
            zero_pad: 0,
        };
        assert_eq!(shhs.format("200001").as_deref(), Some("shhs1-200001"));
    }

    #[test]
    fn test_load_mesa_style_table() {
        let file = write_csv(
            "mesaid,examnumber,race1c,gender1,cucmcn1c,sleepage5c\n\
             1,5,1,0,,70\n\
             2,5,3,1,,\n\
             3,5,3,7,,x\n",
        );
        let table = SubjectTable::load(file.path(), &mesa_columns()).unwrap();

        assert_eq!(table.len(), 3);
        let first = table.get("mesa-sleep-0001").unwrap().as_ref().unwrap();
        assert_eq!(first.gender, Some(Gender::Female));
        assert_eq!(first.age, Some(70));
        assert_eq!(first.weight, None);

        let second = table.get("mesa-sleep-0002").unwrap().as_ref().unwrap();
        assert_eq!(second.gender, Some(Gender::Male));
        assert_eq!(second.age, None);

        let third = table.get("mesa-sleep-0003").unwrap().as_ref().unwrap();
        assert_eq!(third.gender, None);
        assert_eq!(third.age, None);
    }

    #[test]
    fn test_malformed_row_is_scoped_to_its_record() {
        let file = write_csv("mesaid,a,b,gender1,c,sleepage5c\n1,,,1,,old\n2,,,0,,55\n");
        let table = SubjectTable::load(file.path(), &mesa_columns()).unwrap();

        assert!(matches!(
            table.get("mesa-sleep-0001"),
            Some(Err(IngestError::InvalidValue { .. }))
        ));
        assert!(table.get("mesa-sleep-0002").unwrap().is_ok());
        assert!(table.get("mesa-sleep-0003").is_none());
    }

    #[test]
    fn test_missing_named_column() {
        let file = write_csv("nsrrid,gender\n200001,1\n");
        let columns = SubjectColumns {
            id: ColumnRef::Name("nsrrid"),
            id_format: RecordIdFormat {
                prefix: "shhs1-",
                zero_pad: 0,
            },
            gender: Some(ColumnRef::Name("gender")),
            age: Some(ColumnRef::Name("age_s1")),
            weight: None,
            genders: CodeTable::default(),
            encoding: TextEncoding::Windows1252,
        };
        let err = SubjectTable::load(file.path(), &columns).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { .. }));
    }

    #[test]
    fn test_absent_values_are_none_not_zero() {
        let path = Path::new("subjects.csv");
        assert_eq!(parse_age("", path).unwrap(), None);
        assert_eq!(parse_age(" x ", path).unwrap(), None);
        assert_eq!(parse_age("0", path).unwrap(), Some(0));
        assert_eq!(parse_weight("X", path).unwrap(), None);
        assert_eq!(parse_weight("0", path).unwrap(), Some(0.0));
        assert!(parse_age("-3", path).is_err());
    }

    #[test]
    fn test_parse_subject_comment() {
        let genders: CodeTable = [("M", Gender::Male), ("F", Gender::Female)]
            .into_iter()
            .collect();
        let path = Path::new("slp01a.hea");

        let data = parse_subject_comment("44 M 89 32-01-89", &genders, path).unwrap();
        assert_eq!(data.age, Some(44));
        assert_eq!(data.gender, Some(Gender::Male));
        assert_eq!(data.weight, Some(89.0));

        let unknown = parse_subject_comment("x M x 01-02-89", &genders, path).unwrap();
        assert_eq!(unknown.age, None);
        assert_eq!(unknown.weight, None);

        assert!(parse_subject_comment("44", &genders, path).is_err());
    }
}
