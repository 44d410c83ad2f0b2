//! Sleep-study file readers.
//!
//! This crate reads the on-disk formats the record pipeline consumes. It
//! never decides whether a record is skipped; every reader returns a typed
//! [`IngestError`] and leaves that policy to the caller.
//!
//! # Features
//!
//! - **NSRR annotations**: XML `ScoredEvent` streams into a fixed-epoch stage sequence
//! - **WFDB records**: `.hea` headers and MIT-format `.st` stage annotations
//! - **CSV sidecars**: subject demographics, R-point heartbeats, actigraphy and overlap tables
//! - **Cached arrays**: NumPy `.npy` read/write for heartbeat and activity caches
//! - **Discovery**: glob-pattern record listing over a directory tree
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use sleep_ingest::{parse_nsrr_xml, read_npy};
//!
//! let annotation = parse_nsrr_xml(Path::new("mesa-sleep-0001-nsrr.xml"))?;
//! let heartbeats = read_npy(Path::new("preprocessed/heartbeats/mesa-sleep-0001.npy"))?;
//! ```

mod actigraphy;
mod discovery;
mod error;
mod npy;
mod nsrr;
mod rpoints;
mod subjects;
mod tabular;
mod wfdb;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use tabular::{ColumnRef, CsvTable, TextEncoding, read_csv_table, read_f64_column};

// === Annotations ===
pub use nsrr::{parse_nsrr_str, parse_nsrr_xml, stage_from_concept};
pub use wfdb::{
    Annotation, WFDB_EPOCH_SECONDS, WfdbHeader, parse_mit_annotations,
    parse_wfdb_header, read_mit_annotations, read_wfdb_header, stage_from_aux,
    stages_from_annotations,
};

// === Sidecars ===
pub use actigraphy::{ActigraphyRow, ActigraphyTable, OverlapTable};
pub use rpoints::read_rpoint_times;
pub use subjects::{
    CodeTable, RecordIdFormat, SubjectTable, SubjectColumns, UNKNOWN_MARKER, parse_age,
    parse_subject_comment, parse_weight,
};

// === Cache ===
pub use npy::{read_npy, write_npy};

// === Discovery ===
pub use discovery::{RecordPattern, find_files, key_name, record_key};
