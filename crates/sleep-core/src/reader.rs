//! The record driver.
//!
//! A [`RecordReader`] lists the requested records of one dataset when it is
//! created and assembles them one at a time as it is iterated. For each
//! record it resolves heartbeats, parses the stage annotation, optionally
//! aligns activity counts and looks up subject data. A record failing any of
//! these steps is skipped with a [`SkipReason`]; iteration always moves on to
//! the next record.

use std::fs;
use std::path::{Path, PathBuf};

use sleep_ingest::{
    CodeTable, IngestError, OverlapTable, RecordPattern, SubjectTable, WFDB_EPOCH_SECONDS,
    find_files, parse_nsrr_xml, parse_subject_comment, read_mit_annotations, read_wfdb_header,
    record_key, stages_from_annotations,
};
use sleep_model::{ActivitySource, ConfigurationError, ParsedAnnotation, SleepRecord, SubjectData};
use sleep_repository::{RemoteFile, Repository, RepositoryError};
use tracing::{debug, error, info, info_span, warn};

use crate::activity::ActivityResolver;
use crate::dataset::{
    ACTIVITY_COUNTS_DIR, ANNOTATION_DIR, ANNOTATION_SUFFIX, Dataset, DatasetConfig,
    HEARTBEATS_DIR, OVERLAP_DIR, RecordLayout, SubjectSource,
};
use crate::error::{PipelineError, Result, SkipReason};
use crate::files::RecordFiles;
use crate::heartbeats::{HeartbeatResolver, SignalCollaborators};
use crate::options::ReadOptions;
use crate::signal::{HeartbeatDetector, SignalDecoder};
use crate::subjects::load_sidecars;

const WFDB_LISTING_SUFFIX: &str = ".hea";

/// A subject row as loaded, with any per-row parse error.
type SubjectRow = sleep_ingest::Result<SubjectData>;

/// External collaborators a reader may need.
///
/// The repository is required unless reading offline. The decoder and
/// detector are required for detect-mode heartbeats.
#[derive(Clone, Copy, Default)]
pub struct Collaborators<'a> {
    pub repository: Option<&'a dyn Repository>,
    pub decoder: Option<&'a dyn SignalDecoder>,
    pub detector: Option<&'a dyn HeartbeatDetector>,
}

/// Terminal state of one record.
#[derive(Debug)]
pub enum RecordOutcome {
    Emitted(Box<SleepRecord>),
    Skipped { record_id: String, reason: SkipReason },
}

/// Counters for one reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub requested: usize,
    pub emitted: usize,
    pub skipped: usize,
    /// Skips caused by dataset inconsistencies; also counted in `skipped`.
    pub integrity_violations: usize,
}

/// A record selected by the listing.
#[derive(Debug)]
struct PendingRecord {
    key: String,
    /// The listed file, when the listing came from a repository.
    listed: Option<RemoteFile>,
}

/// Lazily assembles the records of one dataset.
pub struct RecordReader<'a> {
    config: DatasetConfig,
    db_dir: PathBuf,
    repository: Option<&'a dyn Repository>,
    heartbeats: HeartbeatResolver<'a>,
    activity: Option<ActivitySource>,
    overlap: Option<OverlapTable>,
    subjects: SubjectTable,
    pending: std::vec::IntoIter<PendingRecord>,
    stats: ReadStats,
}

impl<'a> RecordReader<'a> {
    /// Validates the options, lists the requested records and loads the
    /// dataset-wide tables.
    ///
    /// Every configuration problem is reported here; iteration itself never
    /// fails.
    pub fn new(
        dataset: Dataset,
        options: &ReadOptions,
        collaborators: Collaborators<'a>,
    ) -> Result<Self> {
        let config = dataset.config();
        let heartbeat_source = options.heartbeats.unwrap_or(config.default_heartbeats);
        config.validate_sources(heartbeat_source, options.activity)?;

        let repository = if options.offline {
            None
        } else {
            Some(
                collaborators
                    .repository
                    .ok_or(ConfigurationError::MissingRepository)?,
            )
        };
        let signals = match (collaborators.decoder, collaborators.detector) {
            (Some(decoder), Some(detector)) => Some(SignalCollaborators { decoder, detector }),
            _ => None,
        };
        let heartbeats =
            HeartbeatResolver::new(&config, heartbeat_source, signals, options.keep_raw)?;
        let pattern = compile_pattern(&config, &options.records_pattern)?;

        let db_dir = options.data_dir.join(dataset.slug());
        create_directories(&db_dir, &config, options.activity.is_some())?;

        let records = list_records(&config, &db_dir, &pattern, repository)?;
        let keys: Vec<String> = records.iter().map(|r| r.key.clone()).collect();

        let subjects = match &config.subjects {
            SubjectSource::Sidecars(sidecars) if !keys.is_empty() => {
                load_sidecars(sidecars, &keys, &db_dir, repository)?
            }
            _ => SubjectTable::new(),
        };
        let overlap = match (options.activity, &config.activity) {
            (Some(ActivitySource::Actigraphy), Some(layout)) => Some(load_overlap(
                &db_dir,
                layout.overlap_file,
                layout.overlap_id_column,
                layout.overlap_line_column,
                repository,
            )?),
            _ => None,
        };

        info!(
            dataset = %dataset,
            requested = records.len(),
            subjects = subjects.len(),
            heartbeats = %heartbeat_source,
            offline = options.offline,
            "reading records"
        );

        Ok(Self {
            config,
            db_dir,
            repository,
            heartbeats,
            activity: options.activity,
            overlap,
            subjects,
            stats: ReadStats {
                requested: records.len(),
                ..ReadStats::default()
            },
            pending: records.into_iter(),
        })
    }

    pub fn dataset(&self) -> Dataset {
        self.config.dataset
    }

    /// Dataset directory below the data root.
    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    /// Processes the next record, reporting skips instead of hiding them.
    pub fn next_outcome(&mut self) -> Option<RecordOutcome> {
        let record = self.pending.next()?;
        let record_id = sleep_ingest::key_name(&record.key).to_string();
        let span = info_span!("record", record_id = %record_id);
        let _guard = span.enter();

        let subject = self.subjects.take(&record_id);
        match self.assemble(&record, subject) {
            Ok(sleep_record) => {
                self.stats.emitted += 1;
                debug!(
                    epochs = sleep_record.epoch_count(),
                    heartbeats = sleep_record.heartbeat_times.len(),
                    "emitted record"
                );
                Some(RecordOutcome::Emitted(Box::new(sleep_record)))
            }
            Err(reason) => {
                self.stats.skipped += 1;
                if reason.is_integrity_violation() {
                    self.stats.integrity_violations += 1;
                    error!(reason = %reason, "skipping record");
                } else {
                    warn!(reason = %reason, "skipping record");
                }
                Some(RecordOutcome::Skipped { record_id, reason })
            }
        }
    }

    fn assemble(
        &self,
        record: &PendingRecord,
        subject: Option<SubjectRow>,
    ) -> std::result::Result<SleepRecord, SkipReason> {
        let paths = self.config.paths(&self.db_dir, &record.key);
        let files = RecordFiles::new(paths, self.repository);

        let heartbeat_times = self.heartbeats.resolve(&files)?;

        let (annotation, subject) = match &self.config.subjects {
            SubjectSource::HeaderComment { genders } => {
                read_wfdb_record(&files, record.listed.as_ref(), genders)?
            }
            SubjectSource::Sidecars(_) => {
                (read_nsrr_record(&files, record.listed.as_ref())?, subject)
            }
        };

        let activity_counts = match (self.activity, &self.config.activity) {
            (Some(source), Some(layout)) => Some(
                ActivityResolver::new(source, layout, self.overlap.as_ref())
                    .resolve(&files, &annotation)?,
            ),
            _ => None,
        };

        let subject_data = match subject {
            Some(Ok(data)) => data,
            Some(Err(e)) => return Err(SkipReason::Format(e)),
            None => return Err(SkipReason::MissingSubjectData),
        };

        Ok(SleepRecord {
            id: paths.record_id().to_string(),
            sleep_stages: annotation.sleep_stages,
            sleep_stage_duration: annotation.epoch_duration,
            recording_start_time: annotation.recording_start_time,
            heartbeat_times,
            subject_data,
            activity_counts,
        })
    }
}

impl Iterator for RecordReader<'_> {
    type Item = SleepRecord;

    fn next(&mut self) -> Option<SleepRecord> {
        loop {
            match self.next_outcome()? {
                RecordOutcome::Emitted(record) => return Some(*record),
                RecordOutcome::Skipped { .. } => {}
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.pending.len()))
    }
}

fn compile_pattern(config: &DatasetConfig, records: &str) -> Result<RecordPattern> {
    let compiled = match &config.layout {
        RecordLayout::Nsrr { record_prefix, .. } => {
            RecordPattern::with_affixes(record_prefix, records, ANNOTATION_SUFFIX)
        }
        RecordLayout::Wfdb => RecordPattern::with_affixes("", records, WFDB_LISTING_SUFFIX),
    };
    compiled.map_err(|e| match e {
        IngestError::InvalidPattern { pattern, message } => {
            ConfigurationError::InvalidPattern { pattern, message }.into()
        }
        other => PipelineError::Listing(other),
    })
}

fn create_directories(db_dir: &Path, config: &DatasetConfig, activity: bool) -> Result<()> {
    let mut dirs = vec![db_dir.join(HEARTBEATS_DIR)];
    if matches!(config.layout, RecordLayout::Nsrr { .. }) {
        dirs.push(db_dir.join(ANNOTATION_DIR));
    }
    if activity {
        dirs.push(db_dir.join(ACTIVITY_COUNTS_DIR));
        dirs.push(db_dir.join(OVERLAP_DIR));
    }
    for dir in dirs {
        fs::create_dir_all(&dir)
            .map_err(|source| PipelineError::CreateDirectory { path: dir, source })?;
    }
    Ok(())
}

/// Lists record keys from the repository, or from disk when offline.
fn list_records(
    config: &DatasetConfig,
    db_dir: &Path,
    pattern: &RecordPattern,
    repository: Option<&dyn Repository>,
) -> Result<Vec<PendingRecord>> {
    let (subdir, suffix, recursive) = match &config.layout {
        RecordLayout::Nsrr { recursive, .. } => (ANNOTATION_DIR, ANNOTATION_SUFFIX, *recursive),
        RecordLayout::Wfdb => ("", WFDB_LISTING_SUFFIX, false),
    };

    let mut records: Vec<PendingRecord> = match repository {
        Some(repository) => repository
            .list(subdir, pattern, recursive)?
            .into_iter()
            .filter_map(|file| {
                let within = file
                    .relative_path
                    .strip_prefix(subdir)
                    .map(|rest| rest.trim_start_matches('/'))?;
                let key = within.strip_suffix(suffix)?.to_string();
                Some(PendingRecord {
                    key,
                    listed: Some(file),
                })
            })
            .collect(),
        None => find_files(&db_dir.join(subdir), pattern, recursive)
            .map_err(PipelineError::Listing)?
            .into_iter()
            .filter_map(|relative| {
                Some(PendingRecord {
                    key: record_key(&relative, suffix)?,
                    listed: None,
                })
            })
            .collect(),
    };
    records.sort_by(|a, b| a.key.cmp(&b.key));
    debug!(
        pattern = pattern.as_str(),
        records = records.len(),
        "listed records"
    );
    Ok(records)
}

fn load_overlap(
    db_dir: &Path,
    file_name: &str,
    id_column: &'static str,
    line_column: &'static str,
    repository: Option<&dyn Repository>,
) -> Result<OverlapTable> {
    let relative = format!("{OVERLAP_DIR}/{file_name}");
    let path = db_dir.join(&relative);
    if let Some(repository) = repository {
        match repository.fetch_path(&relative, &path) {
            Ok(()) => {}
            Err(RepositoryError::NotFound { .. }) if path.is_file() => {}
            Err(RepositoryError::NotFound { .. }) => {
                return Err(PipelineError::MissingOverlapTable { path });
            }
            Err(e) => return Err(e.into()),
        }
    } else if !path.is_file() {
        return Err(PipelineError::MissingOverlapTable { path });
    }
    OverlapTable::load(&path, id_column, line_column).map_err(PipelineError::OverlapTable)
}

/// Local path of a record's listed file, fetching it when needed.
fn listed_or_obtain(
    files: &RecordFiles<'_>,
    listed: Option<&RemoteFile>,
    relative: &str,
) -> std::result::Result<PathBuf, SkipReason> {
    if let Some(file) = listed {
        return Ok(files.fetch(file)?);
    }
    files.obtain(relative)?.ok_or_else(|| {
        SkipReason::Format(IngestError::FileNotFound {
            path: files.paths().local(relative),
        })
    })
}

fn read_nsrr_record(
    files: &RecordFiles<'_>,
    listed: Option<&RemoteFile>,
) -> std::result::Result<ParsedAnnotation, SkipReason> {
    let path = listed_or_obtain(files, listed, &files.paths().annotation())?;
    Ok(parse_nsrr_xml(&path)?)
}

/// Reads stages and subject data of a WFDB record.
fn read_wfdb_record(
    files: &RecordFiles<'_>,
    listed_header: Option<&RemoteFile>,
    genders: &CodeTable,
) -> std::result::Result<(ParsedAnnotation, Option<SubjectRow>), SkipReason> {
    let paths = files.paths();
    let header_path = listed_or_obtain(files, listed_header, &paths.header())?;
    let header = read_wfdb_header(&header_path)?;

    let stages_path = listed_or_obtain(files, None, &paths.annotation())?;
    let annotations = read_mit_annotations(&stages_path)?;
    let sleep_stages =
        stages_from_annotations(&annotations, header.sampling_frequency, &stages_path)?;

    let recording_start_time = header.base_time.ok_or_else(|| IngestError::MissingField {
        field: "base time",
        path: header_path.clone(),
    })?;
    let recording_duration = header
        .duration_seconds()
        .unwrap_or_else(|| (sleep_stages.len() as f64) * f64::from(WFDB_EPOCH_SECONDS));

    let subject = header
        .comments
        .first()
        .map(|comment| parse_subject_comment(comment, genders, &header_path));

    Ok((
        ParsedAnnotation {
            sleep_stages,
            epoch_duration: WFDB_EPOCH_SECONDS,
            recording_start_time,
            recording_duration,
        },
        subject,
    ))
}
