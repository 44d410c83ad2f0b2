//! CLI library components for the sleep record reader.

pub mod logging;
pub mod summary;
