//! NSRR XML sleep-stage annotation parser.
//!
//! NSRR exports annotate a polysomnography recording as a flat stream of
//! `<ScoredEvent>` elements:
//!
//! ```text
//! <PSGAnnotation>
//!   <EpochLength>30</EpochLength>
//!   <ScoredEvents>
//!     <ScoredEvent>
//!       <EventType/>
//!       <EventConcept>Recording Start Time</EventConcept>
//!       <Start>0</Start>
//!       <Duration>36960.0</Duration>
//!       <ClockTime>00.00.00 21.23.31</ClockTime>
//!     </ScoredEvent>
//!     <ScoredEvent>
//!       <EventType>Stages|Stages</EventType>
//!       <EventConcept>Wake|0</EventConcept>
//!       <Start>0.0</Start>
//!       <Duration>2130.0</Duration>
//!     </ScoredEvent>
//!     ...
//! ```
//!
//! Staging events span whole multiples of the epoch length and are expanded
//! into one stage per epoch in the order they appear.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveTime;
use serde::Deserialize;

use sleep_model::{ParsedAnnotation, SleepStage};

use crate::error::{IngestError, Result};

const EPOCH_LENGTH: &str = "EpochLength";
const DURATION: &str = "Duration";
const CLOCK_TIME: &str = "ClockTime";

const RECORDING_START: &str = "Recording Start Time";
const STAGING_EVENT_TYPE: &str = "Stages|Stages";

/// Maps an NSRR staging concept to a stage.
///
/// R&K stages 3 and 4 both map to N3. Unknown labels are rejected instead of
/// being scored as undefined.
pub fn stage_from_concept(concept: &str) -> Option<SleepStage> {
    match concept {
        "Wake|0" => Some(SleepStage::Wake),
        "Stage 1 sleep|1" => Some(SleepStage::N1),
        "Stage 2 sleep|2" => Some(SleepStage::N2),
        "Stage 3 sleep|3" | "Stage 4 sleep|4" => Some(SleepStage::N3),
        "REM sleep|5" => Some(SleepStage::Rem),
        "Unscored|9" => Some(SleepStage::Undefined),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct PsgAnnotation {
    #[serde(rename = "EpochLength")]
    epoch_length: Option<String>,
    #[serde(rename = "ScoredEvents")]
    scored_events: Option<ScoredEvents>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoredEvents {
    #[serde(rename = "ScoredEvent", default)]
    events: Vec<ScoredEvent>,
}

#[derive(Debug, Deserialize)]
struct ScoredEvent {
    #[serde(rename = "EventType")]
    event_type: Option<String>,
    #[serde(rename = "EventConcept")]
    concept: Option<String>,
    #[serde(rename = "Duration")]
    duration: Option<String>,
    #[serde(rename = "ClockTime")]
    clock_time: Option<String>,
}

impl ScoredEvent {
    fn event_type(&self) -> &str {
        self.event_type.as_deref().map_or("", str::trim)
    }

    fn concept(&self) -> &str {
        self.concept.as_deref().map_or("", str::trim)
    }

    fn duration(&self) -> &str {
        self.duration.as_deref().map_or("", str::trim)
    }
}

impl PsgAnnotation {
    fn into_parsed(self, path: &Path) -> Result<ParsedAnnotation> {
        let raw_epoch = self
            .epoch_length
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| IngestError::MissingField {
                field: EPOCH_LENGTH,
                path: path.to_path_buf(),
            })?;
        let epoch_duration = raw_epoch
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| IngestError::invalid(EPOCH_LENGTH, raw_epoch, path))?;

        let events = self.scored_events.unwrap_or_default().events;

        // The first event spans the whole recording.
        let raw_duration = events
            .first()
            .map(ScoredEvent::duration)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| IngestError::MissingField {
                field: "recording duration",
                path: path.to_path_buf(),
            })?;
        let recording_duration = raw_duration
            .parse::<f64>()
            .map_err(|_| IngestError::invalid("recording duration", raw_duration, path))?;

        let start_event = events
            .iter()
            .find(|event| event.concept() == RECORDING_START)
            .ok_or_else(|| IngestError::MissingEvent {
                event: RECORDING_START,
                path: path.to_path_buf(),
            })?;
        let recording_start_time =
            parse_clock_time(start_event.clock_time.as_deref().unwrap_or_default(), path)?;

        let mut sleep_stages = Vec::new();
        for event in events.iter().filter(|e| e.event_type() == STAGING_EVENT_TYPE) {
            let concept = event.concept();
            let stage = stage_from_concept(concept).ok_or_else(|| IngestError::UnknownStage {
                label: concept.to_string(),
                path: path.to_path_buf(),
            })?;
            let duration = event
                .duration()
                .parse::<f64>()
                .map_err(|_| IngestError::invalid(DURATION, event.duration(), path))?;
            let whole_seconds = duration.trunc().max(0.0) as u64;
            let epochs = whole_seconds / u64::from(epoch_duration);
            sleep_stages.extend(std::iter::repeat_n(stage, epochs as usize));
        }

        Ok(ParsedAnnotation {
            sleep_stages,
            epoch_duration,
            recording_start_time,
            recording_duration,
        })
    }
}

/// Parses the time-of-day part of a `ClockTime` value such as
/// `"00.00.00 21.23.31"`.
fn parse_clock_time(raw: &str, path: &Path) -> Result<NaiveTime> {
    raw.split_whitespace()
        .nth(1)
        .and_then(|time| NaiveTime::parse_from_str(time, "%H.%M.%S").ok())
        .ok_or_else(|| IngestError::invalid(CLOCK_TIME, raw, path))
}

/// Parses an NSRR annotation file.
///
/// # Errors
///
/// Fails with a format error when `EpochLength`, the recording duration, or
/// the `Recording Start Time` event is missing, when a staging event uses
/// an unknown label, or when the XML is malformed (including references to
/// undefined entities).
pub fn parse_nsrr_xml(path: &Path) -> Result<ParsedAnnotation> {
    let file = File::open(path).map_err(|e| IngestError::read(path, e))?;
    parse_nsrr_reader(BufReader::new(file), path)
}

/// Parses NSRR annotation XML held in memory; `path` is only used in errors.
pub fn parse_nsrr_str(xml: &str, path: &Path) -> Result<ParsedAnnotation> {
    parse_nsrr_reader(xml.as_bytes(), path)
}

fn parse_nsrr_reader<R: BufRead>(source: R, path: &Path) -> Result<ParsedAnnotation> {
    let document: PsgAnnotation =
        quick_xml::de::from_reader(source).map_err(|e| IngestError::Xml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let parsed = document.into_parsed(path)?;
    tracing::debug!(
        path = %path.display(),
        epochs = parsed.sleep_stages.len(),
        epoch_duration = parsed.epoch_duration,
        "parsed NSRR annotation"
    );
    Ok(parsed)
}
