//! Type-safe enumerations shared by every dataset.
//!
//! The integer encodings are part of the public contract: downstream
//! consumers store hypnograms as `i8` arrays, so the ordinal of each variant
//! must never change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Sleep stage according to the AASM guidelines.
///
/// Values start at zero and increase with wakefulness, which makes a plain
/// line plot of the ordinals read as a hypnogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum SleepStage {
    /// Epoch without a usable score.
    Undefined = 0,
    /// Slow-wave sleep (AASM N3, R&K stages 3 and 4).
    N3 = 1,
    N2 = 2,
    N1 = 3,
    Rem = 4,
    Wake = 5,
}

impl SleepStage {
    /// All stages in ordinal order.
    pub const ALL: [SleepStage; 6] = [
        SleepStage::Undefined,
        SleepStage::N3,
        SleepStage::N2,
        SleepStage::N1,
        SleepStage::Rem,
        SleepStage::Wake,
    ];

    /// Returns the stable integer encoding.
    pub fn ordinal(self) -> i8 {
        self as i8
    }

    /// Looks up a stage by its integer encoding.
    pub fn from_ordinal(value: i8) -> Option<Self> {
        Self::ALL.iter().copied().find(|stage| stage.ordinal() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::Undefined => "UNDEFINED",
            SleepStage::N3 => "N3",
            SleepStage::N2 => "N2",
            SleepStage::N1 => "N1",
            SleepStage::Rem => "REM",
            SleepStage::Wake => "WAKE",
        }
    }
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subject gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Gender {
    Female = 0,
    Male = 1,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "FEMALE",
            Gender::Male => "MALE",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where heartbeat times for a record come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatSource {
    /// Precomputed R-point annotations shipped with the dataset.
    #[default]
    Annotation,
    /// Heartbeat times persisted by an earlier `Detect` run.
    Cached,
    /// Run heartbeat detection on the decoded ECG channel.
    Detect,
}

impl HeartbeatSource {
    pub const ALL: [HeartbeatSource; 3] = [
        HeartbeatSource::Annotation,
        HeartbeatSource::Cached,
        HeartbeatSource::Detect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeartbeatSource::Annotation => "annotation",
            HeartbeatSource::Cached => "cached",
            HeartbeatSource::Detect => "detect",
        }
    }
}

impl fmt::Display for HeartbeatSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HeartbeatSource {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "annotation" => Ok(HeartbeatSource::Annotation),
            "cached" => Ok(HeartbeatSource::Cached),
            // "ecg" is the historical name of detection mode.
            "detect" | "ecg" => Ok(HeartbeatSource::Detect),
            _ => Err(ConfigurationError::InvalidOption {
                parameter: "heartbeats_source",
                value: s.to_string(),
                options: option_list(&Self::ALL.map(|v| v.as_str())),
            }),
        }
    }
}

/// Where activity counts for a record come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySource {
    /// Align raw per-minute actigraphy with the sleep-stage epochs.
    Actigraphy,
    /// Activity counts persisted by an earlier `Actigraphy` run.
    Cached,
}

impl ActivitySource {
    pub const ALL: [ActivitySource; 2] = [ActivitySource::Actigraphy, ActivitySource::Cached];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivitySource::Actigraphy => "actigraphy",
            ActivitySource::Cached => "cached",
        }
    }
}

impl fmt::Display for ActivitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivitySource {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "actigraphy" => Ok(ActivitySource::Actigraphy),
            "cached" => Ok(ActivitySource::Cached),
            _ => Err(ConfigurationError::InvalidOption {
                parameter: "activity_source",
                value: s.to_string(),
                options: option_list(&Self::ALL.map(|v| v.as_str())),
            }),
        }
    }
}

fn option_list(options: &[&str]) -> String {
    options.join(", ")
}
