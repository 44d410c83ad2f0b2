//! Data model for assembled sleep records.
//!
//! The types here are shared by the file readers (`sleep-ingest`) and the
//! record pipeline (`sleep-core`):
//!
//! - [`SleepStage`] and [`Gender`] with stable integer encodings
//! - [`SubjectData`], where every field is independently optional
//! - [`ParsedAnnotation`], the intermediate result of reading an annotation file
//! - [`SleepRecord`], the final per-record output
//! - [`HeartbeatSource`] / [`ActivitySource`] reader options and the
//!   [`ConfigurationError`] raised when they are invalid

pub mod enums;
pub mod error;
pub mod record;
pub mod subject;

pub use enums::{ActivitySource, Gender, HeartbeatSource, SleepStage};
pub use error::{ConfigurationError, Result};
pub use record::{ParsedAnnotation, SleepRecord};
pub use subject::SubjectData;
