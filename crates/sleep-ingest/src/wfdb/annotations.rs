//! MIT-format annotation files (e.g. the `.st` sleep-stage annotator).
//!
//! The file is a sequence of little-endian 16-bit words. The top six bits of
//! each word hold the annotation type and the low ten bits an interval (or a
//! length, for pseudo-annotations that modify the previous one).

use std::path::Path;

use crate::error::{IngestError, Result};

const SKIP: u16 = 59;
const NUM: u16 = 60;
const SUB: u16 = 61;
const CHN: u16 = 62;
const AUX: u16 = 63;

/// One annotation with its absolute sample position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub sample: u64,
    pub code: u8,
    pub aux_note: Option<String>,
}

pub fn read_mit_annotations(path: &Path) -> Result<Vec<Annotation>> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::read(path, e))?;
    parse_mit_annotations(&bytes, path)
}

pub fn parse_mit_annotations(bytes: &[u8], path: &Path) -> Result<Vec<Annotation>> {
    let truncated = || IngestError::InvalidValue {
        field: "annotation stream".to_string(),
        value: "truncated".to_string(),
        path: path.to_path_buf(),
    };

    let mut annotations: Vec<Annotation> = Vec::new();
    let mut sample: i64 = 0;
    let mut pos = 0;
    while pos + 2 <= bytes.len() {
        let word = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
        pos += 2;
        let kind = word >> 10;
        let interval = word & 0x03FF;

        match kind {
            0 if interval == 0 => break,
            SKIP => {
                let chunk = bytes.get(pos..pos + 4).ok_or_else(truncated)?;
                let high = u16::from_le_bytes([chunk[0], chunk[1]]);
                let low = u16::from_le_bytes([chunk[2], chunk[3]]);
                sample += i64::from(((u32::from(high) << 16) | u32::from(low)) as i32);
                pos += 4;
            }
            NUM | SUB | CHN => {}
            AUX => {
                let len = usize::from(interval);
                let text = bytes.get(pos..pos + len).ok_or_else(truncated)?;
                pos += len + (len % 2);
                if let Some(last) = annotations.last_mut() {
                    let note = String::from_utf8_lossy(text)
                        .trim_end_matches('\0')
                        .to_string();
                    last.aux_note = Some(note);
                }
            }
            _ => {
                sample += i64::from(interval);
                annotations.push(Annotation {
                    sample: u64::try_from(sample).unwrap_or(0),
                    code: kind as u8,
                    aux_note: None,
                });
            }
        }
    }
    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(kind: u16, interval: u16) -> [u8; 2] {
        ((kind << 10) | interval).to_le_bytes()
    }

    #[test]
    fn test_intervals_accumulate_and_aux_attaches() {
        let mut bytes = Vec::new();
        bytes.extend(word(22, 1));
        bytes.extend(word(AUX, 3));
        bytes.extend(b"W\0\0\0");
        bytes.extend(word(22, 1000));
        bytes.extend(word(AUX, 4));
        bytes.extend(b"2 LA");
        bytes.extend(word(0, 0));

        let annotations = parse_mit_annotations(&bytes, Path::new("slp01a.st")).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].sample, 1);
        assert_eq!(annotations[0].aux_note.as_deref(), Some("W"));
        assert_eq!(annotations[1].sample, 1001);
        assert_eq!(annotations[1].code, 22);
        assert_eq!(annotations[1].aux_note.as_deref(), Some("2 LA"));
    }

    #[test]
    fn test_skip_uses_high_word_first() {
        let mut bytes = Vec::new();
        bytes.extend(word(SKIP, 0));
        // 7500 * 10 = 75000 = 0x0001_24F8
        bytes.extend(1u16.to_le_bytes());
        bytes.extend(0x24F8u16.to_le_bytes());
        bytes.extend(word(22, 0));
        bytes.extend(word(NUM, 1));

        let annotations = parse_mit_annotations(&bytes, Path::new("rec.st")).unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].sample, 75_000);
    }

    #[test]
    fn test_truncated_aux() {
        let mut bytes = Vec::new();
        bytes.extend(word(22, 1));
        bytes.extend(word(AUX, 10));
        bytes.extend(b"R");
        let err = parse_mit_annotations(&bytes, Path::new("rec.st")).unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { .. }));
    }
}
