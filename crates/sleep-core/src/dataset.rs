//! Per-dataset configuration.
//!
//! The datasets share one reader; everything that differs between them
//! (directory layout, sidecar columns, gender codes, ECG channel and the
//! supported sources) is described here.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sleep_ingest::{CodeTable, ColumnRef, RecordIdFormat, SubjectColumns, TextEncoding, key_name};
use sleep_model::{ActivitySource, ConfigurationError, Gender, HeartbeatSource};

// NSRR layout, relative to the dataset directory.
pub const ANNOTATION_DIR: &str = "polysomnography/annotations-events-nsrr";
pub const EDF_DIR: &str = "polysomnography/edfs";
pub const RPOINTS_DIR: &str = "polysomnography/annotations-rpoints";
pub const DATASETS_DIR: &str = "datasets";
pub const ACTIGRAPHY_DIR: &str = "actigraphy";
pub const OVERLAP_DIR: &str = "overlap";

// Caches written by the reader.
pub const HEARTBEATS_DIR: &str = "preprocessed/heartbeats";
pub const ACTIVITY_COUNTS_DIR: &str = "preprocessed/activity_counts";

pub const ANNOTATION_SUFFIX: &str = "-nsrr.xml";
pub const RPOINTS_SUFFIX: &str = "-rpoint.csv";
pub const ACTIVITY_COUNTS_SUFFIX: &str = "-activity-counts.npy";

/// A supported sleep-study dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Multi-Ethnic Study of Atherosclerosis (NSRR).
    Mesa,
    /// Sleep Heart Health Study (NSRR).
    Shhs,
    /// MIT-BIH Polysomnographic Database (PhysioNet).
    Slpdb,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Mesa, Dataset::Shhs, Dataset::Slpdb];

    /// Directory name below the data root.
    pub fn slug(&self) -> &'static str {
        match self {
            Dataset::Mesa => "mesa",
            Dataset::Shhs => "shhs",
            Dataset::Slpdb => "slpdb",
        }
    }

    pub fn config(&self) -> DatasetConfig {
        match self {
            Dataset::Mesa => mesa(),
            Dataset::Shhs => shhs(),
            Dataset::Slpdb => slpdb(),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Dataset {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mesa" => Ok(Dataset::Mesa),
            "shhs" => Ok(Dataset::Shhs),
            "slpdb" => Ok(Dataset::Slpdb),
            _ => Err(ConfigurationError::InvalidOption {
                parameter: "dataset",
                value: s.to_string(),
                options: Self::ALL.map(|d| d.slug()).join(", "),
            }),
        }
    }
}

/// How records and their annotations are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLayout {
    /// NSRR layout: XML annotations, EDF recordings and R-point sidecars.
    Nsrr {
        /// File-name prefix in front of the record glob.
        record_prefix: &'static str,
        /// Whether record keys include a subdirectory.
        recursive: bool,
        /// Column of the R-point sidecar holding beat times in seconds.
        rpoint_column: usize,
    },
    /// PhysioNet WFDB layout: `.hea`/`.dat`/`.st` at the dataset root.
    Wfdb,
}

/// One subject sidecar under `datasets/`.
#[derive(Debug, Clone)]
pub struct SubjectSidecar {
    /// File-name glob, e.g. `shhs1-dataset-*.csv`.
    pub pattern: &'static str,
    /// Record keys this sidecar describes start with this prefix.
    pub key_prefix: &'static str,
    pub columns: SubjectColumns,
}

/// Where subject demographics come from.
#[derive(Debug, Clone)]
pub enum SubjectSource {
    Sidecars(Vec<SubjectSidecar>),
    /// The first comment line of each record's WFDB header.
    HeaderComment { genders: CodeTable },
}

/// Actigraphy alignment inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLayout {
    /// Overlap table file name under `overlap/`.
    pub overlap_file: &'static str,
    pub overlap_id_column: &'static str,
    pub overlap_line_column: &'static str,
    /// Position of the numeric subject id in the `-`-separated record id.
    pub subject_token: usize,
}

impl ActivityLayout {
    /// Numeric subject id for the overlap lookup.
    pub fn subject_number(&self, record_id: &str) -> Option<u64> {
        record_id.split('-').nth(self.subject_token)?.parse().ok()
    }
}

/// Everything the reader needs to know about one dataset.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub dataset: Dataset,
    pub layout: RecordLayout,
    pub ecg_channel: &'static str,
    pub heartbeat_sources: &'static [HeartbeatSource],
    pub default_heartbeats: HeartbeatSource,
    pub activity: Option<ActivityLayout>,
    pub subjects: SubjectSource,
}

impl DatasetConfig {
    /// Rejects heartbeat and activity sources the dataset cannot serve.
    pub fn validate_sources(
        &self,
        heartbeats: HeartbeatSource,
        activity: Option<ActivitySource>,
    ) -> Result<(), ConfigurationError> {
        if !self.heartbeat_sources.contains(&heartbeats) {
            return Err(ConfigurationError::Unsupported {
                dataset: self.dataset.slug(),
                parameter: "heartbeats_source",
                value: heartbeats.to_string(),
            });
        }
        if let Some(activity) = activity
            && self.activity.is_none()
        {
            return Err(ConfigurationError::Unsupported {
                dataset: self.dataset.slug(),
                parameter: "activity_source",
                value: activity.to_string(),
            });
        }
        Ok(())
    }

    /// File paths of one record below `db_dir`.
    pub fn paths<'a>(&self, db_dir: &'a Path, key: &'a str) -> RecordPaths<'a> {
        RecordPaths {
            db_dir,
            key,
            wfdb: matches!(self.layout, RecordLayout::Wfdb),
        }
    }
}

/// Resolves the files belonging to one record key.
///
/// Relative paths use `/` and match the repository layout; absolute paths
/// live below the dataset directory.
#[derive(Debug, Clone, Copy)]
pub struct RecordPaths<'a> {
    db_dir: &'a Path,
    key: &'a str,
    wfdb: bool,
}

impl RecordPaths<'_> {
    pub fn local(&self, relative: &str) -> PathBuf {
        self.db_dir.join(relative)
    }

    /// The record id emitted in [`SleepRecord`](sleep_model::SleepRecord).
    pub fn record_id(&self) -> &str {
        key_name(self.key)
    }

    pub fn annotation(&self) -> String {
        if self.wfdb {
            format!("{}.st", self.key)
        } else {
            format!("{ANNOTATION_DIR}/{}{ANNOTATION_SUFFIX}", self.key)
        }
    }

    pub fn header(&self) -> String {
        format!("{}.hea", self.key)
    }

    pub fn signal_data(&self) -> String {
        format!("{}.dat", self.key)
    }

    /// The file handed to the signal decoder.
    pub fn raw_recording(&self) -> String {
        if self.wfdb {
            self.header()
        } else {
            format!("{EDF_DIR}/{}.edf", self.key)
        }
    }

    pub fn rpoints(&self) -> String {
        format!("{RPOINTS_DIR}/{}{RPOINTS_SUFFIX}", self.key)
    }

    pub fn actigraphy(&self) -> String {
        format!("{ACTIGRAPHY_DIR}/{}.csv", self.key)
    }

    pub fn heartbeats_cache(&self) -> PathBuf {
        self.db_dir
            .join(HEARTBEATS_DIR)
            .join(format!("{}.npy", self.key))
    }

    pub fn activity_cache(&self) -> PathBuf {
        self.db_dir
            .join(ACTIVITY_COUNTS_DIR)
            .join(format!("{}{ACTIVITY_COUNTS_SUFFIX}", self.key))
    }
}

fn mesa() -> DatasetConfig {
    DatasetConfig {
        dataset: Dataset::Mesa,
        layout: RecordLayout::Nsrr {
            record_prefix: "mesa-sleep-",
            recursive: false,
            rpoint_column: 18,
        },
        ecg_channel: "EKG",
        heartbeat_sources: &HeartbeatSource::ALL,
        default_heartbeats: HeartbeatSource::Annotation,
        activity: Some(ActivityLayout {
            overlap_file: "mesa-actigraphy-psg-overlap.csv",
            overlap_id_column: "mesaid",
            overlap_line_column: "line",
            subject_token: 2,
        }),
        subjects: SubjectSource::Sidecars(vec![SubjectSidecar {
            pattern: "mesa-sleep-dataset-*.csv",
            key_prefix: "mesa-sleep-",
            columns: SubjectColumns {
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
            },
        }]),
    }
}

/// Visit 1 and visit 2 ship separate sidecars; weight is only in visit 1.
fn shhs_sidecar(visit: u8) -> SubjectSidecar {
    let (pattern, key_prefix, id_prefix, age, weight) = match visit {
        1 => ("shhs1-dataset-*.csv", "shhs1/", "shhs1-", "age_s1", Some("weight")),
        _ => ("shhs2-dataset-*.csv", "shhs2/", "shhs2-", "age_s2", None),
    };
    SubjectSidecar {
        pattern,
        key_prefix,
        columns: SubjectColumns {
            id: ColumnRef::Name("nsrrid"),
            id_format: RecordIdFormat {
                prefix: id_prefix,
                zero_pad: 0,
            },
            gender: Some(ColumnRef::Name("gender")),
            age: Some(ColumnRef::Name(age)),
            weight: weight.map(ColumnRef::Name),
            genders: [("2", Gender::Female), ("1", Gender::Male)]
                .into_iter()
                .collect(),
            encoding: TextEncoding::Windows1252,
        },
    }
}

fn shhs() -> DatasetConfig {
    DatasetConfig {
        dataset: Dataset::Shhs,
        layout: RecordLayout::Nsrr {
            record_prefix: "",
            recursive: true,
            rpoint_column: 19,
        },
        ecg_channel: "ECG",
        heartbeat_sources: &HeartbeatSource::ALL,
        default_heartbeats: HeartbeatSource::Annotation,
        activity: None,
        subjects: SubjectSource::Sidecars(vec![shhs_sidecar(1), shhs_sidecar(2)]),
    }
}

fn slpdb() -> DatasetConfig {
    DatasetConfig {
        dataset: Dataset::Slpdb,
        layout: RecordLayout::Wfdb,
        ecg_channel: "ECG",
        heartbeat_sources: &[HeartbeatSource::Detect, HeartbeatSource::Cached],
        default_heartbeats: HeartbeatSource::Detect,
        activity: None,
        subjects: SubjectSource::HeaderComment {
            genders: [("M", Gender::Male), ("F", Gender::Female)]
                .into_iter()
                .collect(),
        },
    }
}
