//! PhysioNet WFDB records: header files and MIT-format annotations.

mod annotations;
mod header;
mod stages;

pub use annotations::{Annotation, parse_mit_annotations, read_mit_annotations};
pub use header::{WfdbHeader, parse_wfdb_header, read_wfdb_header};
pub use stages::{WFDB_EPOCH_SECONDS, stage_from_aux, stages_from_annotations};
