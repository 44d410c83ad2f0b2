//! Heartbeat resolution.
//!
//! Heartbeat times come from one of three places: the dataset's R-point
//! sidecar, an array cached by an earlier detect run, or detection over the
//! decoded ECG channel. Whatever the source, the returned times are sorted
//! ascending; some R-point sidecars contain out-of-order rows.

use std::fs;

use sleep_ingest::{ColumnRef, read_npy, read_rpoint_times, write_npy};
use sleep_model::{ConfigurationError, HeartbeatSource};
use tracing::{debug, warn};

use crate::dataset::{DatasetConfig, RecordLayout};
use crate::error::SkipReason;
use crate::files::RecordFiles;
use crate::signal::{HeartbeatDetector, SignalDecoder, detect_heartbeat_times};

/// The decoder and detector used by detect mode.
#[derive(Clone, Copy)]
pub struct SignalCollaborators<'a> {
    pub decoder: &'a dyn SignalDecoder,
    pub detector: &'a dyn HeartbeatDetector,
}

#[derive(Clone, Copy)]
enum Mode<'a> {
    Annotation { column: usize },
    Cached,
    Detect {
        signals: SignalCollaborators<'a>,
        channel: &'static str,
        keep_raw: bool,
        wfdb: bool,
    },
}

/// Resolves heartbeat times for records of one dataset.
#[derive(Clone, Copy)]
pub struct HeartbeatResolver<'a> {
    mode: Mode<'a>,
}

impl<'a> HeartbeatResolver<'a> {
    /// Builds a resolver for `source`.
    ///
    /// Detect mode needs signal collaborators; annotation mode needs a
    /// dataset with R-point sidecars.
    pub fn new(
        config: &DatasetConfig,
        source: HeartbeatSource,
        signals: Option<SignalCollaborators<'a>>,
        keep_raw: bool,
    ) -> Result<Self, ConfigurationError> {
        let mode = match source {
            HeartbeatSource::Annotation => match config.layout {
                RecordLayout::Nsrr { rpoint_column, .. } => Mode::Annotation {
                    column: rpoint_column,
                },
                RecordLayout::Wfdb => {
                    return Err(ConfigurationError::Unsupported {
                        dataset: config.dataset.slug(),
                        parameter: "heartbeats_source",
                        value: source.to_string(),
                    });
                }
            },
            HeartbeatSource::Cached => Mode::Cached,
            HeartbeatSource::Detect => Mode::Detect {
                signals: signals.ok_or(ConfigurationError::MissingSignalCollaborators)?,
                channel: config.ecg_channel,
                keep_raw,
                wfdb: matches!(config.layout, RecordLayout::Wfdb),
            },
        };
        Ok(Self { mode })
    }

    /// Heartbeat times in seconds from recording start, sorted ascending.
    pub fn resolve(&self, files: &RecordFiles<'_>) -> Result<Vec<f64>, SkipReason> {
        let mut times = match self.mode {
            Mode::Annotation { column } => {
                let path = files
                    .obtain(&files.paths().rpoints())?
                    .ok_or(SkipReason::MissingHeartbeats)?;
                read_rpoint_times(&path, ColumnRef::Index(column))?
            }
            Mode::Cached => {
                let path = files.paths().heartbeats_cache();
                if !path.is_file() {
                    return Err(SkipReason::MissingCachedHeartbeats);
                }
                read_npy(&path)?
            }
            Mode::Detect {
                signals,
                channel,
                keep_raw,
                wfdb,
            } => detect(files, signals, channel, keep_raw, wfdb)?,
        };
        sort_times(&mut times);
        Ok(times)
    }
}

/// Sorts heartbeat times ascending.
pub fn sort_times(times: &mut [f64]) {
    times.sort_by(f64::total_cmp);
}

fn detect(
    files: &RecordFiles<'_>,
    signals: SignalCollaborators<'_>,
    channel: &str,
    keep_raw: bool,
    wfdb: bool,
) -> Result<Vec<f64>, SkipReason> {
    let paths = files.paths();
    let raw = paths.raw_recording();
    let raw_path = paths.local(&raw);
    let was_present = raw_path.is_file();

    if wfdb {
        // The header names the signal file; both must be present to decode.
        files
            .obtain(&paths.signal_data())?
            .ok_or(SkipReason::MissingHeartbeats)?;
    }
    let raw_path = files.obtain(&raw)?.ok_or(SkipReason::MissingHeartbeats)?;

    let mut times = detect_heartbeat_times(signals.decoder, signals.detector, &raw_path, channel)?;
    sort_times(&mut times);
    debug!(beats = times.len(), path = %raw_path.display(), "detected heartbeats");

    let cache = paths.heartbeats_cache();
    write_npy(&cache, &times).map_err(SkipReason::Cache)?;

    if !was_present && !keep_raw && !wfdb {
        if let Err(e) = fs::remove_file(&raw_path) {
            warn!(path = %raw_path.display(), error = %e, "failed to remove raw recording");
        } else {
            debug!(path = %raw_path.display(), "removed raw recording");
        }
    }
    Ok(times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use proptest::prelude::*;

    #[test]
    fn test_annotation_mode_rejected_for_wfdb() {
        let config = Dataset::Slpdb.config();
        let err = HeartbeatResolver::new(&config, HeartbeatSource::Annotation, None, false)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigurationError::Unsupported { .. }));
    }

    #[test]
    fn test_detect_requires_collaborators() {
        let config = Dataset::Mesa.config();
        let err = HeartbeatResolver::new(&config, HeartbeatSource::Detect, None, false)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigurationError::MissingSignalCollaborators));
    }

    #[test]
    fn test_annotation_uses_dataset_column() {
        let resolver =
            HeartbeatResolver::new(&Dataset::Shhs.config(), HeartbeatSource::Annotation, None, false)
                .unwrap();
        assert!(matches!(resolver.mode, Mode::Annotation { column: 19 }));
    }

    proptest! {
        #[test]
        fn prop_sorted_times_are_non_decreasing(
            mut times in prop::collection::vec(0.0f64..100_000.0, 0..200)
        ) {
            let len = times.len();
            sort_times(&mut times);
            prop_assert_eq!(times.len(), len);
            prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
