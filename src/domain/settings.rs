//! Live session settings.
//!
//! Settings are persisted through the store and loaded back when a
//! session starts; a session cannot start without them. Validation
//! happens on `configure` and again on `start`, so a hand-edited store
//! cannot smuggle impossible parameters past the engine.

use serde::{Deserialize, Serialize};

use super::backtest::validate_run_params;
use super::ensemble;
use super::error::TradewindError;
use super::strategy::StrategyKind;

pub const DEFAULT_EVAL_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_GUARD_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSettings {
    pub instrument: String,
    pub strategy: StrategyKind,
    pub initial_balance: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub risk_per_trade_pct: f64,
    pub ensemble_threshold: f64,
    /// Optional fixed-price entry gate: buy when the close falls to
    /// this level or below.
    pub buy_price: Option<f64>,
    /// Optional fixed-price exit gate: sell when the close reaches
    /// this level or above.
    pub sell_price: Option<f64>,
    /// Cadence of full strategy evaluation.
    pub eval_interval_ms: u64,
    /// Cadence of the protective stop-loss/take-profit re-check.
    pub guard_interval_ms: u64,
}

impl LiveSettings {
    pub fn new(instrument: impl Into<String>, strategy: StrategyKind) -> Self {
        LiveSettings {
            instrument: instrument.into(),
            strategy,
            initial_balance: 10_000.0,
            stop_loss_pct: 5.0,
            take_profit_pct: 10.0,
            risk_per_trade_pct: 10.0,
            ensemble_threshold: ensemble::DEFAULT_THRESHOLD,
            buy_price: None,
            sell_price: None,
            eval_interval_ms: DEFAULT_EVAL_INTERVAL_MS,
            guard_interval_ms: DEFAULT_GUARD_INTERVAL_MS,
        }
    }

    pub fn validate(&self) -> Result<(), TradewindError> {
        let invalid = |key: &str, reason: &str| TradewindError::ConfigInvalid {
            section: "live".to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if self.instrument.trim().is_empty() {
            return Err(TradewindError::ConfigMissing {
                section: "live".to_string(),
                key: "instrument".to_string(),
            });
        }

        validate_run_params(
            "live",
            self.initial_balance,
            self.stop_loss_pct,
            self.take_profit_pct,
            self.risk_per_trade_pct,
            self.ensemble_threshold,
        )?;

        if let Some(buy) = self.buy_price {
            if !(buy > 0.0) {
                return Err(invalid("buy_price", "must be positive"));
            }
        }
        if let Some(sell) = self.sell_price {
            if !(sell > 0.0) {
                return Err(invalid("sell_price", "must be positive"));
            }
        }
        if let (Some(buy), Some(sell)) = (self.buy_price, self.sell_price) {
            if buy >= sell {
                return Err(invalid("buy_price", "must be below sell_price"));
            }
        }

        if self.eval_interval_ms == 0 {
            return Err(invalid("eval_interval_ms", "must be positive"));
        }
        if self.guard_interval_ms == 0 {
            return Err(invalid("guard_interval_ms", "must be positive"));
        }
        if self.guard_interval_ms > self.eval_interval_ms {
            return Err(invalid(
                "guard_interval_ms",
                "must not exceed eval_interval_ms",
            ));
        }

        Ok(())
    }
}
