//! Tabular sidecar reading.

mod reader;

pub use reader::{ColumnRef, CsvTable, TextEncoding, read_csv_table, read_f64_column};
