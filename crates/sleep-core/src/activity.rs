//! Actigraphy alignment.
//!
//! The actigraph and the polysomnograph run on independent clocks. The
//! overlap table gives the actigraphy line where the polysomnography
//! recording starts; the end is found by rounding the recording's end time
//! onto the 30 second grid and looking up the actigraphy row with that clock
//! label. The resulting slice is reconciled against the number of sleep
//! stages: a difference of up to [`LENGTH_TOLERANCE`] epochs is truncated or
//! padded by repeating the tail, anything larger skips the record.

use std::path::Path;

use chrono::{NaiveTime, TimeDelta, Timelike};
use sleep_ingest::{ActigraphyTable, IngestError, OverlapTable, read_npy, write_npy};
use sleep_model::{ActivitySource, ParsedAnnotation};
use tracing::debug;

use crate::dataset::ActivityLayout;
use crate::error::SkipReason;
use crate::files::RecordFiles;

/// Largest tolerated difference between activity counts and sleep stages.
pub const LENGTH_TOLERANCE: usize = 2;

/// Grid the recording end time is rounded onto, in seconds.
pub const ALIGNMENT_GRID_SECONDS: u32 = 30;

/// End of the recording rounded to the nearest grid boundary.
///
/// Rounds half up at 15 seconds. Only the whole-second component is
/// rounded; sub-second precision is carried along. Times wrap at midnight.
pub fn round_end_time(start: NaiveTime, duration: f64) -> NaiveTime {
    let micros = (duration * 1_000_000.0).round() as i64;
    let (end, _) = start.overflowing_add_signed(TimeDelta::microseconds(micros));

    let remainder = end.second() % ALIGNMENT_GRID_SECONDS;
    let shift = if remainder >= ALIGNMENT_GRID_SECONDS / 2 {
        i64::from(ALIGNMENT_GRID_SECONDS - remainder)
    } else {
        -i64::from(remainder)
    };
    end.overflowing_add_signed(TimeDelta::seconds(shift)).0
}

/// Clock label as written in actigraphy exports: `3:05:00`, not `03:05:00`.
pub fn clock_label(time: NaiveTime) -> String {
    let label = time.format("%H:%M:%S").to_string();
    label.trim_start_matches('0').to_string()
}

/// Aligns an actigraphy export to `expected_len` epochs.
///
/// `overlap_line` is the subject's entry in the overlap table; data rows
/// start one line later. The row labelled `end_label` gives the exclusive
/// end index through its `line` value. `source` is only used in error
/// messages.
pub fn align_activity(
    table: &ActigraphyTable,
    source: &Path,
    overlap_line: usize,
    end_label: &str,
    expected_len: usize,
) -> Result<Vec<f64>, SkipReason> {
    let start = overlap_line + 1;
    let boundary = table
        .rows
        .iter()
        .skip(start)
        .find(|row| row.linetime == end_label)
        .ok_or_else(|| SkipReason::MissingBoundaryRow {
            label: end_label.to_string(),
        })?;
    let end: usize = boundary
        .line
        .trim()
        .parse()
        .map_err(|_| SkipReason::MissingBoundaryRow {
            label: end_label.to_string(),
        })?;

    let end = end.min(table.len());
    let candidate: Vec<&str> = if start < end {
        table.rows[start..end]
            .iter()
            .map(|row| row.activity.as_str())
            .collect()
    } else {
        Vec::new()
    };

    let reconciled = reconcile_length(&candidate, expected_len).ok_or(
        SkipReason::ActivityLengthMismatch {
            candidate: candidate.len(),
            expected: expected_len,
        },
    )?;
    reconciled
        .into_iter()
        .map(|raw| parse_count(raw, source))
        .collect()
}

/// Truncates or pads `candidate` to exactly `expected` entries.
///
/// Padding appends the last `d` entries again. Returns `None` when the
/// lengths differ by more than [`LENGTH_TOLERANCE`] or padding cannot reach
/// the expected length.
pub fn reconcile_length<T: Clone>(candidate: &[T], expected: usize) -> Option<Vec<T>> {
    let len = candidate.len();
    if len.abs_diff(expected) > LENGTH_TOLERANCE {
        return None;
    }
    let mut out = candidate[..len.min(expected)].to_vec();
    if len < expected {
        let missing = expected - len;
        if missing > len {
            return None;
        }
        out.extend_from_slice(&candidate[len - missing..]);
    }
    Some(out)
}

/// Blank cells count as zero.
fn parse_count(raw: &str, source: &Path) -> Result<f64, SkipReason> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>().map_err(|_| {
        SkipReason::Format(IngestError::InvalidValue {
            field: "activity".to_string(),
            value: raw.to_string(),
            path: source.to_path_buf(),
        })
    })
}

/// Resolves activity counts for records of an actigraphy dataset.
pub struct ActivityResolver<'a> {
    source: ActivitySource,
    layout: &'a ActivityLayout,
    overlap: Option<&'a OverlapTable>,
}

impl<'a> ActivityResolver<'a> {
    /// `overlap` must be loaded when `source` is
    /// [`ActivitySource::Actigraphy`].
    pub fn new(
        source: ActivitySource,
        layout: &'a ActivityLayout,
        overlap: Option<&'a OverlapTable>,
    ) -> Self {
        Self {
            source,
            layout,
            overlap,
        }
    }

    /// Activity counts matching `annotation`'s stage sequence.
    pub fn resolve(
        &self,
        files: &RecordFiles<'_>,
        annotation: &ParsedAnnotation,
    ) -> Result<Vec<f64>, SkipReason> {
        let paths = files.paths();
        let cache = paths.activity_cache();
        match self.source {
            ActivitySource::Cached => {
                if !cache.is_file() {
                    return Err(SkipReason::MissingCachedActivity);
                }
                Ok(read_npy(&cache)?)
            }
            ActivitySource::Actigraphy => {
                let overlap_line = self
                    .layout
                    .subject_number(paths.record_id())
                    .and_then(|subject| self.overlap?.start_line(subject))
                    .ok_or(SkipReason::MissingOverlap)?;
                let path = files
                    .obtain(&paths.actigraphy())?
                    .ok_or(SkipReason::MissingActivityData)?;
                let table = ActigraphyTable::load(&path)?;

                let end = round_end_time(
                    annotation.recording_start_time,
                    annotation.recording_duration,
                );
                let label = clock_label(end);
                let counts = align_activity(
                    &table,
                    &path,
                    overlap_line,
                    &label,
                    annotation.sleep_stages.len(),
                )?;
                debug!(
                    counts = counts.len(),
                    overlap_line,
                    end = %label,
                    "aligned actigraphy"
                );

                write_npy(&cache, &counts).map_err(SkipReason::Cache)?;
                Ok(counts)
            }
        }
    }
}
