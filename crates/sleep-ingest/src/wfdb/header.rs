//! WFDB header (`.hea`) files.

use std::path::Path;

use chrono::NaiveTime;

use crate::error::{IngestError, Result};

/// Record-level information from a header file.
#[derive(Debug, Clone, PartialEq)]
pub struct WfdbHeader {
    pub sampling_frequency: f64,
    pub sample_count: Option<u64>,
    pub base_time: Option<NaiveTime>,
    /// Comment lines without the leading `#`, in file order.
    pub comments: Vec<String>,
}

impl WfdbHeader {
    /// Recording duration in seconds, if the sample count is declared.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.sample_count
            .map(|count| count as f64 / self.sampling_frequency)
    }
}

const DEFAULT_SAMPLING_FREQUENCY: f64 = 250.0;

pub fn read_wfdb_header(path: &Path) -> Result<WfdbHeader> {
    let text = std::fs::read_to_string(path).map_err(|e| IngestError::read(path, e))?;
    parse_wfdb_header(&text, path)
}

/// Parses header text; `path` is only used in errors.
pub fn parse_wfdb_header(text: &str, path: &Path) -> Result<WfdbHeader> {
    let mut comments = Vec::new();
    let mut lines = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(comment) = trimmed.strip_prefix('#') {
            comments.push(comment.trim().to_string());
        } else if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    let record_line = lines.first().ok_or_else(|| IngestError::MissingField {
        field: "record line",
        path: path.to_path_buf(),
    })?;
    let fields: Vec<&str> = record_line.split_whitespace().collect();

    let signal_count = match fields.get(1) {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| IngestError::invalid("signal count", *raw, path))?,
        None => 0,
    };
    let sampling_frequency = match fields.get(2) {
        Some(raw) => parse_frequency(raw)
            .ok_or_else(|| IngestError::invalid("sampling frequency", *raw, path))?,
        None => DEFAULT_SAMPLING_FREQUENCY,
    };
    let sample_count = fields
        .get(3)
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| IngestError::invalid("sample count", *raw, path))
        })
        .transpose()?;
    let base_time = fields
        .get(4)
        .map(|raw| parse_base_time(raw).ok_or_else(|| IngestError::invalid("base time", *raw, path)))
        .transpose()?;

    // Signal lines follow the record line; only their presence is checked.
    let signals_present = lines.len() - 1;
    if signals_present < signal_count {
        return Err(IngestError::invalid(
            "signal count",
            format!("{signal_count} declared, {signals_present} present"),
            path,
        ));
    }

    Ok(WfdbHeader {
        sampling_frequency,
        sample_count,
        base_time,
        comments,
    })
}

/// `"250"`, `"250/1000"` and `"250(0)"` all mean 250 Hz.
fn parse_frequency(raw: &str) -> Option<f64> {
    let end = raw.find(['/', '(']).unwrap_or(raw.len());
    raw[..end].parse::<f64>().ok().filter(|fs| *fs > 0.0)
}

fn parse_base_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLP01A: &str = "slp01a 4 250 1800000 23:07:00
slp01a.dat 212 2000/mV 12 0 -4 9591 0 ECG
slp01a.dat 212 1000/mmHg 12 0 -126 -1390 0 BP
slp01a.dat 212 400(-240)/uV 12 0 -205 -26787 0 EEG (C4-A1)
slp01a.dat 212 100/l 12 0 -24 -24131 0 Resp (sum)
# 44 M 89 32-01-89
";

    #[test]
    fn test_parse_slpdb_header() {
        let header = parse_wfdb_header(SLP01A, Path::new("slp01a.hea")).unwrap();
        assert_eq!(header.sampling_frequency, 250.0);
        assert_eq!(header.sample_count, Some(1_800_000));
        assert_eq!(header.base_time, NaiveTime::from_hms_opt(23, 7, 0));
        assert_eq!(header.comments, vec!["44 M 89 32-01-89"]);
        assert_eq!(header.duration_seconds(), Some(7200.0));
    }

    #[test]
    fn test_minimal_record_line() {
        let header = parse_wfdb_header("rec 0\n", Path::new("rec.hea")).unwrap();
        assert_eq!(header.sampling_frequency, DEFAULT_SAMPLING_FREQUENCY);
        assert_eq!(header.base_time, None);
        assert_eq!(header.sample_count, None);
    }

    #[test]
    fn test_frequency_variants() {
        assert_eq!(parse_frequency("360/720"), Some(360.0));
        assert_eq!(parse_frequency("128(0)"), Some(128.0));
        assert_eq!(parse_frequency("0"), None);
    }

    #[test]
    fn test_missing_signal_lines() {
        let err = parse_wfdb_header("rec 2 250\nrec.dat 16 200 16 0 0 0 0 ECG\n", Path::new("rec.hea"))
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { .. }));
    }

    #[test]
    fn test_empty_header() {
        let err = parse_wfdb_header("# only a comment\n", Path::new("rec.hea")).unwrap_err();
        assert!(matches!(err, IngestError::MissingField { .. }));
    }
}
