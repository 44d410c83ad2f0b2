//! Reader options.

use std::path::PathBuf;

use sleep_model::{ActivitySource, HeartbeatSource};

/// Options for reading one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Glob selecting record ids, `*` for all.
    pub records_pattern: String,
    /// Heartbeat source; `None` uses the dataset default.
    pub heartbeats: Option<HeartbeatSource>,
    /// Activity source; `None` skips activity counts.
    pub activity: Option<ActivitySource>,
    /// Only use files already on disk.
    pub offline: bool,
    /// Keep raw recordings fetched for heartbeat detection.
    pub keep_raw: bool,
    /// Root holding one directory per dataset.
    pub data_dir: PathBuf,
}

impl ReadOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            records_pattern: "*".to_string(),
            heartbeats: None,
            activity: None,
            offline: false,
            keep_raw: false,
            data_dir: data_dir.into(),
        }
    }

    pub fn with_records(mut self, pattern: impl Into<String>) -> Self {
        self.records_pattern = pattern.into();
        self
    }

    pub fn with_heartbeats(mut self, source: HeartbeatSource) -> Self {
        self.heartbeats = Some(source);
        self
    }

    pub fn with_activity(mut self, source: ActivitySource) -> Self {
        self.activity = Some(source);
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn keep_raw(mut self, keep_raw: bool) -> Self {
        self.keep_raw = keep_raw;
        self
    }
}
