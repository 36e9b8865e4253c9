//! Domain error types.

/// Top-level error type for goldencross.
#[derive(Debug, thiserror::Error)]
pub enum GoldenCrossError {
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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("invalid price series at row {index}: {reason}")]
    InvalidSeries { index: usize, reason: String },

    #[error("series misaligned: expected {expected} values, got {actual}")]
    Alignment { expected: usize, actual: usize },

    #[error("no data for {ticker} between {start} and {end}")]
    NoData {
        ticker: String,
        start: String,
        end: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GoldenCrossError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        GoldenCrossError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&GoldenCrossError> for std::process::ExitCode {
    fn from(err: &GoldenCrossError) -> Self {
        let code: u8 = match err {
            GoldenCrossError::Io(_) => 1,
            GoldenCrossError::ConfigParse { .. }
            | GoldenCrossError::ConfigMissing { .. }
            | GoldenCrossError::ConfigInvalid { .. } => 2,
            GoldenCrossError::Data { .. }
            | GoldenCrossError::InvalidSeries { .. }
            | GoldenCrossError::Alignment { .. } => 3,
            GoldenCrossError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
