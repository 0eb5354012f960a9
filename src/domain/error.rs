//! Domain error types.

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

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

    #[error("signals for {generator} requested before update")]
    NotComputed { generator: String },

    #[error("operation {id} is already closed")]
    AlreadyClosed { id: u64 },

    #[error("generator {name} is already registered")]
    DuplicateGenerator { name: String },

    #[error("{bound} date can't be empty")]
    MissingDateRange { bound: &'static str },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl SigtraderError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        SigtraderError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        SigtraderError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) | SigtraderError::Json(_) | SigtraderError::Csv(_) => 1,
            SigtraderError::Configuration { .. }
            | SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. }
            | SigtraderError::DuplicateGenerator { .. } => 2,
            SigtraderError::NotComputed { .. } | SigtraderError::AlreadyClosed { .. } => 3,
            SigtraderError::MissingDateRange { .. }
            | SigtraderError::NoData { .. }
            | SigtraderError::Data { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
