//! Domain error types.

/// Top-level error type for emasweep.
#[derive(Debug, thiserror::Error)]
pub enum EmasweepError {
    #[error("data format error: {reason}")]
    DataFormat { reason: String },

    #[error("{name} out of range: {value} not in [{min}, {max})")]
    OutOfRange {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("snapshot error: {reason}")]
    Snapshot { reason: String },

    #[error("no cached sweep results: run a sweep first")]
    SweepMissing,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EmasweepError> for std::process::ExitCode {
    fn from(err: &EmasweepError) -> Self {
        let code: u8 = match err {
            EmasweepError::Io(_) => 1,
            EmasweepError::ConfigParse { .. }
            | EmasweepError::ConfigMissing { .. }
            | EmasweepError::ConfigInvalid { .. } => 2,
            EmasweepError::DataFormat { .. } => 3,
            EmasweepError::OutOfRange { .. } => 4,
            EmasweepError::Snapshot { .. } => 5,
            EmasweepError::SweepMissing => 6,
        };
        std::process::ExitCode::from(code)
    }
}
