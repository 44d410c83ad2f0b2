//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use sleep_core::Dataset;
use sleep_model::{ActivitySource, HeartbeatSource};

#[derive(Parser)]
#[command(
    name = "sleep-records",
    version,
    about = "Assemble sleep records from MESA, SHHS and SLPDB",
    long_about = "Assemble per-subject sleep records (sleep stages, heartbeat times,\n\
                  subject data and optional actigraphy) from public sleep-study datasets.\n\n\
                  Records whose data is incomplete are skipped and reported in the log."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read the records of one dataset.
    Read(ReadArgs),

    /// Show the resolved data directory and settings file.
    Config(ConfigArgs),
}

#[derive(Parser)]
pub struct ReadArgs {
    /// Dataset to read.
    #[arg(value_enum, value_name = "DATASET")]
    pub dataset: DatasetArg,

    /// Glob selecting record ids (e.g. `00*` for MESA, `shhs1-2000*` for SHHS).
    #[arg(long = "records", value_name = "PATTERN", default_value = "*")]
    pub records: String,

    /// Heartbeat source (default depends on the dataset).
    #[arg(long = "heartbeats", value_enum)]
    pub heartbeats: Option<HeartbeatsArg>,

    /// Also read activity counts (MESA only).
    #[arg(long = "activity", value_enum)]
    pub activity: Option<ActivityArg>,

    /// Use only files already in the data directory.
    #[arg(long = "offline")]
    pub offline: bool,

    /// Keep raw recordings fetched for heartbeat detection.
    #[arg(long = "keep-raw")]
    pub keep_raw: bool,

    /// Data root (overrides the environment and settings file).
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory mirroring the data root to fetch missing files from.
    #[arg(long = "mirror", value_name = "DIR", required_unless_present = "offline")]
    pub mirror: Option<PathBuf>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Parser)]
pub struct ConfigArgs {
    /// Store this data root in the settings file.
    #[arg(long = "set-data-dir", value_name = "DIR")]
    pub set_data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DatasetArg {
    Mesa,
    Shhs,
    Slpdb,
}

impl From<DatasetArg> for Dataset {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::Mesa => Dataset::Mesa,
            DatasetArg::Shhs => Dataset::Shhs,
            DatasetArg::Slpdb => Dataset::Slpdb,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum HeartbeatsArg {
    Annotation,
    Cached,
    Detect,
}

impl From<HeartbeatsArg> for HeartbeatSource {
    fn from(arg: HeartbeatsArg) -> Self {
        match arg {
            HeartbeatsArg::Annotation => HeartbeatSource::Annotation,
            HeartbeatsArg::Cached => HeartbeatSource::Cached,
            HeartbeatsArg::Detect => HeartbeatSource::Detect,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ActivityArg {
    Actigraphy,
    Cached,
}

impl From<ActivityArg> for ActivitySource {
    fn from(arg: ActivityArg) -> Self {
        match arg {
            ActivityArg::Actigraphy => ActivitySource::Actigraphy,
            ActivityArg::Cached => ActivitySource::Cached,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
