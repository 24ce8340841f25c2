//! Domain error types.

/// Top-level error type for tradewind.
///
/// Feed failures (`DataUnavailable`) are recoverable: a live tick that
/// hits one is skipped and retried on the next interval. Configuration
/// errors are surfaced to the caller before a run starts and never
/// silently corrected. An indicator whose lookback is not yet satisfied
/// is not an error at all; it yields `None` values and the strategy
/// simply does not signal there.
#[derive(Debug, thiserror::Error)]
pub enum TradewindError {
    #[error("market data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("no saved live settings; run `tradewind configure` first")]
    MissingConfiguration,

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

    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradewindError> for std::process::ExitCode {
    fn from(err: &TradewindError) -> Self {
        let code: u8 = match err {
            TradewindError::Io(_) => 1,
            TradewindError::ConfigParse { .. }
            | TradewindError::ConfigMissing { .. }
            | TradewindError::ConfigInvalid { .. }
            | TradewindError::MissingConfiguration => 2,
            TradewindError::Store { .. } => 3,
            TradewindError::Csv { .. } => 4,
            TradewindError::DataUnavailable { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
