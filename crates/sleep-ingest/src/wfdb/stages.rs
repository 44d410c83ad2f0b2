//! Sleep stages from WFDB `.st` annotations.

use std::path::Path;

use sleep_model::SleepStage;

use super::annotations::Annotation;
use crate::error::{IngestError, Result};

/// Epoch length used by the WFDB sleep-stage annotator.
pub const WFDB_EPOCH_SECONDS: u32 = 30;

/// Maps the first character of an aux note to a stage.
pub fn stage_from_aux(note: &str) -> Option<SleepStage> {
    match note.chars().next()? {
        'W' => Some(SleepStage::Wake),
        'R' => Some(SleepStage::Rem),
        '1' => Some(SleepStage::N1),
        '2' => Some(SleepStage::N2),
        '3' | '4' => Some(SleepStage::N3),
        _ => None,
    }
}

/// Builds the epoch sequence from stage annotations.
///
/// Epochs without a stage annotation stay [`SleepStage::Undefined`]. The
/// sequence ends with the epoch of the last staged annotation. Annotations
/// are placed by integer division of their sample by the epoch length, so an
/// annotation at sample 1 lands in epoch 0.
pub fn stages_from_annotations(
    annotations: &[Annotation],
    sampling_frequency: f64,
    path: &Path,
) -> Result<Vec<SleepStage>> {
    let epoch_samples = f64::from(WFDB_EPOCH_SECONDS) * sampling_frequency;
    let epoch_of = |sample: u64| (sample as f64 / epoch_samples).floor() as usize;

    let staged: Vec<(usize, SleepStage)> = annotations
        .iter()
        .filter_map(|a| {
            let stage = stage_from_aux(a.aux_note.as_deref()?)?;
            Some((epoch_of(a.sample), stage))
        })
        .collect();

    let last = staged
        .last()
        .map(|(epoch, _)| *epoch)
        .ok_or_else(|| IngestError::MissingEvent {
            event: "sleep stage annotation",
            path: path.to_path_buf(),
        })?;

    let mut stages = vec![SleepStage::Undefined; last + 1];
    for (epoch, stage) in staged {
        if let Some(slot) = stages.get_mut(epoch) {
            *slot = stage;
        }
    }
    Ok(stages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(sample: u64, text: &str) -> Annotation {
        Annotation {
            sample,
            code: 22,
            aux_note: Some(text.to_string()),
        }
    }

    #[test]
    fn test_gaps_are_undefined() {
        let annotations = vec![
            note(1, "W"),
            note(7500, "1"),
            note(22500, "4 L"),
            note(30000, "MT"),
        ];
        let stages = stages_from_annotations(&annotations, 250.0, Path::new("slp01a.st")).unwrap();
        assert_eq!(
            stages,
            vec![
                SleepStage::Wake,
                SleepStage::N1,
                SleepStage::Undefined,
                SleepStage::N3,
            ]
        );
    }

    #[test]
    fn test_unstaged_notes_do_not_extend_the_sequence() {
        let annotations = vec![note(1, "R"), note(75_000, "M")];
        let stages = stages_from_annotations(&annotations, 250.0, Path::new("slp01a.st")).unwrap();
        assert_eq!(stages, vec![SleepStage::Rem]);
    }

    #[test]
    fn test_no_staged_annotations() {
        let err = stages_from_annotations(&[note(1, "MT")], 250.0, Path::new("x.st")).unwrap_err();
        assert!(matches!(err, IngestError::MissingEvent { .. }));
    }
}
