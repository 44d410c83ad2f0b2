//! Assembled sleep records and the intermediate annotation result.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::enums::SleepStage;
use crate::subject::SubjectData;

/// Sleep-stage annotation of one recording, as read from an annotation file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnnotation {
    /// One stage per epoch, in temporal order.
    pub sleep_stages: Vec<SleepStage>,
    /// Epoch length in seconds, constant within a file.
    pub epoch_duration: u32,
    /// Wall-clock time of day at which the recording started.
    pub recording_start_time: NaiveTime,
    /// Recording duration in seconds. The last epoch may be partial, so this
    /// only approximates `sleep_stages.len() * epoch_duration`.
    pub recording_duration: f64,
}

/// A single assembled sleep record.
///
/// Built once per record immediately before it is handed to the caller and
/// never touched by the reader afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub id: String,
    pub sleep_stages: Vec<SleepStage>,
    /// Duration of each sleep stage in seconds.
    pub sleep_stage_duration: u32,
    pub recording_start_time: NaiveTime,
    /// Heartbeat times in seconds relative to recording start, non-decreasing.
    pub heartbeat_times: Vec<f64>,
    pub subject_data: SubjectData,
    /// Activity counts aligned with `sleep_stages`, when requested.
    pub activity_counts: Option<Vec<f64>>,
}

impl SleepRecord {
    /// Number of scored epochs.
    pub fn epoch_count(&self) -> usize {
        self.sleep_stages.len()
    }

    /// Mean heart rate in beats per minute over the span covered by the
    /// heartbeats, or `None` with fewer than two beats.
    pub fn mean_heart_rate(&self) -> Option<f64> {
        let (first, last) = match (self.heartbeat_times.first(), self.heartbeat_times.last()) {
            (Some(first), Some(last)) if self.heartbeat_times.len() > 1 => (*first, *last),
            _ => return None,
        };
        let span = last - first;
        if span <= 0.0 {
            return None;
        }
        Some((self.heartbeat_times.len() - 1) as f64 * 60.0 / span)
    }

    /// Sleep stages as their stable integer encoding.
    pub fn stage_ordinals(&self) -> Vec<i8> {
        self.sleep_stages.iter().map(|stage| stage.ordinal()).collect()
    }
}
