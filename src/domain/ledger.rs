//! Position and trade ledger for a single traded instrument.
//!
//! The model supports at most one open long position at a time: a
//! position is created by a buy execution and destroyed by the matching
//! sell. Quantities are fractional (crypto-style) and never negative.
//! Trades are immutable once appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::signal::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeReason {
    Signal,
    StopLoss,
    TakeProfit,
    ForcedClose,
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TradeReason::Signal => "signal",
            TradeReason::StopLoss => "stop-loss",
            TradeReason::TakeProfit => "take-profit",
            TradeReason::ForcedClose => "forced-close",
        };
        write!(f, "{name}")
    }
}

/// Immutable execution record. `value` is the cost for buys and the
/// revenue for sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub side: Direction,
    pub price: f64,
    pub quantity: f64,
    pub value: f64,
    pub reason: TradeReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_index: usize,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    /// Unrealized profit/loss as a percentage of the entry price.
    pub fn unrealized_pct(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price * 100.0
    }

    /// Protective exit check against the current price, stop-loss
    /// first. A percentage of 0 disables the corresponding trigger.
    pub fn exit_trigger(&self, price: f64, stop_loss_pct: f64, take_profit_pct: f64) -> Option<TradeReason> {
        let pnl_pct = self.unrealized_pct(price);
        if stop_loss_pct > 0.0 && pnl_pct <= -stop_loss_pct {
            Some(TradeReason::StopLoss)
        } else if take_profit_pct > 0.0 && pnl_pct >= take_profit_pct {
            Some(TradeReason::TakeProfit)
        } else {
            None
        }
    }
}

/// Cash, the open position (if any), and the append-only trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub cash: f64,
    pub initial_balance: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
}

impl Ledger {
    pub fn new(initial_balance: f64) -> Self {
        Ledger {
            cash: initial_balance,
            initial_balance,
            position: None,
            trades: Vec::new(),
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    /// Cash plus the open position marked at the given price.
    pub fn equity(&self, price: f64) -> f64 {
        let position_value = self
            .position
            .as_ref()
            .map(|p| p.market_value(price))
            .unwrap_or(0.0);
        self.cash + position_value
    }

    /// Open a position by investing `invest` cash at `price`. Returns
    /// the recorded buy trade, or `None` when a position is already
    /// open or the amount is not executable.
    pub fn open_position(
        &mut self,
        index: usize,
        timestamp: DateTime<Utc>,
        price: f64,
        invest: f64,
    ) -> Option<Trade> {
        if self.position.is_some() || price <= 0.0 || invest <= 0.0 || invest > self.cash {
            return None;
        }

        let quantity = invest / price;
        self.cash -= invest;
        self.position = Some(Position {
            quantity,
            entry_price: price,
            entry_index: index,
        });

        let trade = Trade {
            index,
            timestamp,
            side: Direction::Buy,
            price,
            quantity,
            value: invest,
            reason: TradeReason::Signal,
        };
        self.trades.push(trade.clone());
        Some(trade)
    }

    /// Liquidate the whole open position at `price`. Returns the
    /// recorded sell trade, or `None` when no position is open.
    pub fn close_position(
        &mut self,
        index: usize,
        timestamp: DateTime<Utc>,
        price: f64,
        reason: TradeReason,
    ) -> Option<Trade> {
        let position = self.position.take()?;
        let revenue = position.quantity * price;
        self.cash += revenue;

        let trade = Trade {
            index,
            timestamp,
            side: Direction::Sell,
            price,
            quantity: position.quantity,
            value: revenue,
            reason,
        };
        self.trades.push(trade.clone());
        Some(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    }

    fn sample_position() -> Position {
        Position {
            quantity: 10.0,
            entry_price: 100.0,
            entry_index: 3,
        }
    }

    #[test]
    fn unrealized_pct_moves_with_price() {
        let pos = sample_position();
        assert!((pos.unrealized_pct(110.0) - 10.0).abs() < 1e-9);
        assert!((pos.unrealized_pct(95.0) - (-5.0)).abs() < 1e-9);
    }

    #[test]
    fn exit_trigger_stop_loss() {
        let pos = sample_position();
        assert_eq!(
            pos.exit_trigger(94.9, 5.0, 10.0),
            Some(TradeReason::StopLoss)
        );
        assert_eq!(
            pos.exit_trigger(95.0, 5.0, 10.0),
            Some(TradeReason::StopLoss)
        );
        assert_eq!(pos.exit_trigger(95.1, 5.0, 10.0), None);
    }

    #[test]
    fn exit_trigger_take_profit() {
        let pos = sample_position();
        assert_eq!(
            pos.exit_trigger(110.0, 5.0, 10.0),
            Some(TradeReason::TakeProfit)
        );
        assert_eq!(pos.exit_trigger(109.9, 5.0, 10.0), None);
    }

    #[test]
    fn exit_trigger_disabled_by_zero() {
        let pos = sample_position();
        assert_eq!(pos.exit_trigger(1.0, 0.0, 0.0), None);
        assert_eq!(pos.exit_trigger(1000.0, 0.0, 0.0), None);
    }

    #[test]
    fn open_position_debits_cash_and_sizes_quantity() {
        let mut ledger = Ledger::new(10_000.0);
        let trade = ledger.open_position(0, ts(), 100.0, 1_000.0).unwrap();

        assert!((trade.quantity - 10.0).abs() < 1e-9);
        assert!((trade.value - 1_000.0).abs() < 1e-9);
        assert_eq!(trade.side, Direction::Buy);
        assert!((ledger.cash - 9_000.0).abs() < 1e-9);
        assert!(ledger.has_position());
        assert_eq!(ledger.trades.len(), 1);
    }

    #[test]
    fn open_position_rejects_double_entry() {
        let mut ledger = Ledger::new(10_000.0);
        assert!(ledger.open_position(0, ts(), 100.0, 1_000.0).is_some());
        assert!(ledger.open_position(1, ts(), 100.0, 1_000.0).is_none());
        assert_eq!(ledger.trades.len(), 1);
    }

    #[test]
    fn open_position_rejects_overdraft() {
        let mut ledger = Ledger::new(500.0);
        assert!(ledger.open_position(0, ts(), 100.0, 1_000.0).is_none());
        assert!((ledger.cash - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn close_position_credits_revenue() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.open_position(0, ts(), 100.0, 1_000.0);
        let trade = ledger
            .close_position(5, ts(), 150.0, TradeReason::Signal)
            .unwrap();

        assert_eq!(trade.side, Direction::Sell);
        assert!((trade.value - 1_500.0).abs() < 1e-9);
        assert!((ledger.cash - 10_500.0).abs() < 1e-9);
        assert!(!ledger.has_position());
        assert_eq!(ledger.trades.len(), 2);
    }

    #[test]
    fn close_without_position_is_none() {
        let mut ledger = Ledger::new(10_000.0);
        assert!(ledger
            .close_position(0, ts(), 100.0, TradeReason::Signal)
            .is_none());
        assert!(ledger.trades.is_empty());
    }

    #[test]
    fn equity_marks_position_to_market() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.open_position(0, ts(), 100.0, 1_000.0);

        assert!((ledger.equity(100.0) - 10_000.0).abs() < 1e-9);
        assert!((ledger.equity(150.0) - 10_500.0).abs() < 1e-9);
        assert!((ledger.equity(50.0) - 9_500.0).abs() < 1e-9);
    }

    #[test]
    fn ledger_round_trips_through_serde() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.open_position(0, ts(), 100.0, 1_000.0);
        ledger.close_position(2, ts(), 110.0, TradeReason::TakeProfit);

        let json = serde_json::to_string(&ledger).unwrap();
        let restored: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ledger);
    }
}
