//! Backtest engine: a single synchronous pass over a historical series.
//!
//! Exits are evaluated before entries on every bar, in a fixed
//! priority: stop-loss, then take-profit, then strategy sell signal.
//! The first match closes the whole position. Entries size the trade
//! as a fixed fraction of current cash. Given identical inputs the
//! engine produces an identical trade log and equity curve; nothing in
//! here draws on randomness.

use serde::Serialize;

use super::bar::PriceBar;
use super::ensemble;
use super::error::TradewindError;
use super::ledger::{Ledger, Trade, TradeReason};
use super::metrics::RunMetrics;
use super::signal::Direction;
use super::strategy::{generate_signals, StrategyKind};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_balance: f64,
    pub strategy: StrategyKind,
    /// Percent decline from entry that forces an exit; 0 disables.
    pub stop_loss_pct: f64,
    /// Percent gain from entry that takes profit; 0 disables.
    pub take_profit_pct: f64,
    /// Percent of current cash invested per entry.
    pub risk_per_trade_pct: f64,
    pub ensemble_threshold: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_balance: 10_000.0,
            strategy: StrategyKind::Ensemble,
            stop_loss_pct: 5.0,
            take_profit_pct: 10.0,
            risk_per_trade_pct: 10.0,
            ensemble_threshold: ensemble::DEFAULT_THRESHOLD,
        }
    }
}

impl BacktestConfig {
    /// Reject impossible parameters before a run; nothing is silently
    /// corrected.
    pub fn validate(&self) -> Result<(), TradewindError> {
        validate_run_params(
            "backtest",
            self.initial_balance,
            self.stop_loss_pct,
            self.take_profit_pct,
            self.risk_per_trade_pct,
            self.ensemble_threshold,
        )
    }
}

/// Shared parameter checks for backtest configs and live settings.
pub(crate) fn validate_run_params(
    section: &str,
    initial_balance: f64,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    risk_per_trade_pct: f64,
    ensemble_threshold: f64,
) -> Result<(), TradewindError> {
    let invalid = |key: &str, reason: &str| TradewindError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if !(initial_balance > 0.0) {
        return Err(invalid("initial_balance", "must be positive"));
    }
    if !(risk_per_trade_pct > 0.0 && risk_per_trade_pct <= 100.0) {
        return Err(invalid("risk_per_trade", "must be within (0, 100]"));
    }
    if stop_loss_pct < 0.0 {
        return Err(invalid("stop_loss", "must be non-negative"));
    }
    if take_profit_pct < 0.0 {
        return Err(invalid("take_profit", "must be non-negative"));
    }
    if stop_loss_pct > 0.0 && take_profit_pct > 0.0 && stop_loss_pct >= take_profit_pct {
        return Err(invalid("stop_loss", "must be below take_profit"));
    }
    if !(ensemble_threshold > 0.0) {
        return Err(invalid("ensemble_threshold", "must be positive"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    /// Mark-to-market portfolio value per processed bar, preceded by
    /// the initial balance: one more point than there are bars.
    pub equity_curve: Vec<f64>,
    pub metrics: RunMetrics,
}

pub fn run_backtest(
    bars: &[PriceBar],
    config: &BacktestConfig,
) -> Result<BacktestResult, TradewindError> {
    config.validate()?;

    let signals = generate_signals(config.strategy, bars, config.ensemble_threshold);
    let mut signal_iter = signals.iter().peekable();

    let mut ledger = Ledger::new(config.initial_balance);
    let mut equity_curve = Vec::with_capacity(bars.len() + 1);
    equity_curve.push(config.initial_balance);

    for (i, bar) in bars.iter().enumerate() {
        let signal = match signal_iter.peek() {
            Some(s) if s.index == i => signal_iter.next(),
            _ => None,
        };

        if let Some(position) = &ledger.position {
            let reason = position
                .exit_trigger(bar.close, config.stop_loss_pct, config.take_profit_pct)
                .or(match signal {
                    Some(s) if s.direction == Direction::Sell => Some(TradeReason::Signal),
                    _ => None,
                });
            if let Some(reason) = reason {
                ledger.close_position(i, bar.timestamp, bar.close, reason);
            }
        } else if let Some(s) = signal {
            if s.direction == Direction::Buy {
                let invest = ledger.cash * config.risk_per_trade_pct / 100.0;
                ledger.open_position(i, bar.timestamp, bar.close, invest);
            }
        }

        equity_curve.push(ledger.equity(bar.close));
    }

    if ledger.has_position() {
        if let Some(last) = bars.last() {
            ledger.close_position(
                bars.len() - 1,
                last.timestamp,
                last.close,
                TradeReason::ForcedClose,
            );
        }
    }

    let metrics = RunMetrics::compute(&ledger.trades, &equity_curve, config.initial_balance);

    Ok(BacktestResult {
        trades: ledger.trades,
        equity_curve,
        metrics,
    })
}
