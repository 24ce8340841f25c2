//! Performance metrics over a trade log and equity curve.
//!
//! Metrics are derived values: they are recomputed from the trade log
//! and equity curve on demand and never mutated separately.

use serde::Serialize;

use super::ledger::Trade;
use super::signal::Direction;

const TRADING_PERIODS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub returns_pct: f64,
    pub final_equity: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    /// Fraction of closed round-trips that ended in profit.
    pub win_rate: f64,
    /// Gross profit over gross loss; `f64::INFINITY` when there are
    /// profits but no losses, 0 when there are no profits either.
    pub profit_factor: f64,
    pub total_trades: usize,
    pub closed_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub gross_profit: f64,
    pub gross_loss: f64,
}

impl RunMetrics {
    pub fn compute(trades: &[Trade], equity_curve: &[f64], initial_balance: f64) -> Self {
        let final_equity = equity_curve.last().copied().unwrap_or(initial_balance);
        let returns_pct = if initial_balance > 0.0 {
            (final_equity - initial_balance) / initial_balance * 100.0
        } else {
            0.0
        };

        let mut closed_trades = 0usize;
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;

        for (cost, revenue) in closed_round_trips(trades) {
            closed_trades += 1;
            let pnl = revenue - cost;
            if pnl > 0.0 {
                trades_won += 1;
                gross_profit += pnl;
            } else if pnl < 0.0 {
                trades_lost += 1;
                gross_loss += -pnl;
            }
        }

        let win_rate = if closed_trades > 0 {
            trades_won as f64 / closed_trades as f64
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        RunMetrics {
            returns_pct,
            final_equity,
            max_drawdown_pct: max_drawdown_pct(equity_curve),
            sharpe_ratio: sharpe_ratio(equity_curve),
            win_rate,
            profit_factor,
            total_trades: trades.len(),
            closed_trades,
            trades_won,
            trades_lost,
            gross_profit,
            gross_loss,
        }
    }
}

/// Pair each buy with its following sell, yielding (cost, revenue).
/// With at most one open position at a time the log alternates, so a
/// linear scan suffices; a trailing unmatched buy is ignored.
fn closed_round_trips(trades: &[Trade]) -> Vec<(f64, f64)> {
    let mut round_trips = Vec::new();
    let mut open_cost: Option<f64> = None;

    for trade in trades {
        match trade.side {
            Direction::Buy => open_cost = Some(trade.value),
            Direction::Sell => {
                if let Some(cost) = open_cost.take() {
                    round_trips.push((cost, trade.value));
                }
            }
        }
    }

    round_trips
}

/// Largest peak-to-trough percentage decline, tracked via a running
/// peak. Always >= 0; exactly 0 for a non-decreasing curve.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;

    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// Annualized mean-over-stddev of per-bar returns; 0 when the return
/// volatility is 0.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_PERIODS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
