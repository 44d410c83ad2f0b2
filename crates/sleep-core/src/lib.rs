//! Sleep record assembly.
//!
//! Combines stage annotations, heartbeat times, subject demographics and
//! optional actigraphy of one dataset into [`SleepRecord`](sleep_model::SleepRecord)s,
//! produced lazily by a [`RecordReader`].
//!
//! # Features
//!
//! - **Datasets**: MESA and SHHS (NSRR layout) and SLPDB (PhysioNet WFDB layout)
//! - **Heartbeats**: R-point annotations, cached arrays, or detection through caller-supplied collaborators
//! - **Actigraphy**: overlap-anchored alignment onto the 30 second epoch grid (MESA)
//! - **Caching**: detected heartbeats and aligned activity counts are persisted as `.npy`
//! - **Per-record skips**: a failing record is logged with its reason and skipped
//!
//! # Example
//!
//! ```ignore
//! use sleep_core::{Collaborators, Dataset, ReadOptions, RecordReader, resolve_data_dir};
//!
//! let options = ReadOptions::new(resolve_data_dir(None)).offline(true);
//! let reader = RecordReader::new(Dataset::Mesa, &options, Collaborators::default())?;
//! for record in reader {
//!     println!("{}: {} epochs", record.id, record.epoch_count());
//! }
//! ```

pub mod activity;
pub mod dataset;
mod error;
mod files;
pub mod heartbeats;
mod options;
mod reader;
pub mod settings;
mod signal;
mod subjects;

// === Error Types ===
pub use error::{PipelineError, Result, SkipReason};

// === Datasets ===
pub use dataset::{Dataset, DatasetConfig, RecordLayout, RecordPaths};

// === Reading ===
pub use files::RecordFiles;
pub use options::ReadOptions;
pub use reader::{Collaborators, ReadStats, RecordOutcome, RecordReader};

// === Resolvers ===
pub use activity::{ActivityResolver, align_activity, clock_label, round_end_time};
pub use heartbeats::{HeartbeatResolver, SignalCollaborators};
pub use subjects::load_sidecars;

// === Signal Collaborators ===
pub use signal::{HeartbeatDetector, Signal, SignalDecoder, SignalError, detect_heartbeat_times};

// === Settings ===
pub use settings::{Settings, resolve_data_dir};
