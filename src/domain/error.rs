//! Domain error types.

/// Top-level error type for tradesetup.
#[derive(Debug, thiserror::Error)]
pub enum TradeSetupError {
    #[error("insufficient data: have {have} candles, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    InvalidConfig {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid risk input: {reason}")]
    InvalidRiskInput { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("data load error: {reason}")]
    DataLoad { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TradeSetupError {
    pub(crate) fn invalid_config(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TradeSetupError::InvalidConfig {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TradeSetupError> for std::process::ExitCode {
    fn from(err: &TradeSetupError) -> Self {
        let code: u8 = match err {
            TradeSetupError::Io(_) | TradeSetupError::Json(_) => 1,
            TradeSetupError::ConfigParse { .. } | TradeSetupError::InvalidConfig { .. } => 2,
            TradeSetupError::DataLoad { .. } => 3,
            TradeSetupError::InsufficientData { .. } | TradeSetupError::InvalidCandle { .. } => 5,
            TradeSetupError::InvalidRiskInput { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
