use thiserror::Error;

/// Invalid reader arguments, raised when a reader is constructed and never
/// while records are being produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("invalid value for `{parameter}`: {value} (possible options: {options})")]
    InvalidOption {
        parameter: &'static str,
        value: String,
        options: String,
    },

    #[error("{dataset} does not support {parameter} = {value}")]
    Unsupported {
        dataset: &'static str,
        parameter: &'static str,
        value: String,
    },

    #[error("heartbeat source `detect` requires a signal decoder and a heartbeat detector")]
    MissingSignalCollaborators,

    #[error("online mode requires a repository; pass one or enable offline mode")]
    MissingRepository,

    #[error("invalid record pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;
