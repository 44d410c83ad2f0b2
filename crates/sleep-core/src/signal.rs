//! Signal collaborators used by heartbeat detection.
//!
//! Decoding raw polysomnography files and detecting heartbeats are outside
//! this crate. Callers supply implementations of these traits when reading
//! with [`HeartbeatSource::Detect`](sleep_model::HeartbeatSource::Detect).

use std::path::{Path, PathBuf};

use thiserror::Error;

/// One decoded channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub samples: Vec<f64>,
    /// Sampling rate in Hz.
    pub sampling_rate: f64,
}

/// Errors reported by signal collaborators.
#[derive(Debug, Error)]
pub enum SignalError {
    /// The recording has no channel with the requested name.
    #[error("channel {channel} not found in {path}")]
    MissingChannel { channel: String, path: PathBuf },

    /// The recording could not be decoded.
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Heartbeat detection failed.
    #[error("heartbeat detection failed: {message}")]
    Detection { message: String },
}

/// Decodes a named channel from a raw recording.
pub trait SignalDecoder {
    fn decode(&self, path: &Path, channel: &str) -> Result<Signal, SignalError>;
}

/// Detects heartbeats in an ECG signal.
pub trait HeartbeatDetector {
    /// Returns increasing sample indices of detected beats.
    fn detect(&self, samples: &[f64], sampling_rate: f64) -> Result<Vec<u64>, SignalError>;
}

/// Decodes `channel` and converts detected beat indices to seconds.
pub fn detect_heartbeat_times(
    decoder: &dyn SignalDecoder,
    detector: &dyn HeartbeatDetector,
    path: &Path,
    channel: &str,
) -> Result<Vec<f64>, SignalError> {
    let signal = decoder.decode(path, channel)?;
    if signal.sampling_rate.is_nan() || signal.sampling_rate <= 0.0 {
        return Err(SignalError::Decode {
            path: path.to_path_buf(),
            message: format!("invalid sampling rate {}", signal.sampling_rate),
        });
    }
    let indices = detector.detect(&signal.samples, signal.sampling_rate)?;
    Ok(indices
        .into_iter()
        .map(|index| index as f64 / signal.sampling_rate)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f64);

    impl SignalDecoder for Constant {
        fn decode(&self, path: &Path, channel: &str) -> Result<Signal, SignalError> {
            if channel != "ECG" {
                return Err(SignalError::MissingChannel {
                    channel: channel.to_string(),
                    path: path.to_path_buf(),
                });
            }
            Ok(Signal {
                samples: vec![0.0; 1000],
                sampling_rate: self.0,
            })
        }
    }

    struct EveryHundred;

    impl HeartbeatDetector for EveryHundred {
        fn detect(&self, samples: &[f64], _sampling_rate: f64) -> Result<Vec<u64>, SignalError> {
            Ok((0..samples.len() as u64).step_by(100).collect())
        }
    }

    #[test]
    fn test_indices_become_seconds() {
        let times =
            detect_heartbeat_times(&Constant(200.0), &EveryHundred, Path::new("r.edf"), "ECG")
                .unwrap();
        assert_eq!(times.len(), 10);
        assert_eq!(times[1], 0.5);
    }

    #[test]
    fn test_missing_channel() {
        let err = detect_heartbeat_times(&Constant(200.0), &EveryHundred, Path::new("r.edf"), "EKG")
            .unwrap_err();
        assert!(matches!(err, SignalError::MissingChannel { .. }));
    }

    #[test]
    fn test_rejects_zero_sampling_rate() {
        let err = detect_heartbeat_times(&Constant(0.0), &EveryHundred, Path::new("r.edf"), "ECG")
            .unwrap_err();
        assert!(matches!(err, SignalError::Decode { .. }));
    }
}
