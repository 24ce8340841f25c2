//! Report sink port trait.
//!
//! The engines emit structured results; presentation subscribes here
//! and is otherwise opaque to the core.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradewindError;
use crate::domain::ledger::Trade;

pub trait ReportPort: Send + Sync {
    /// Called once after each completed backtest run.
    fn on_backtest(&self, result: &BacktestResult) -> Result<(), TradewindError>;

    /// Called after each executed live trade.
    fn on_trade(&self, trade: &Trade) -> Result<(), TradewindError>;
}
