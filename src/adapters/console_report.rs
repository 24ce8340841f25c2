//! Console report sink.
//!
//! Prints a run summary after a backtest and one line per live trade.
//! Summary goes to stderr alongside the other progress output; trade
//! records go to stdout so they can be piped.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradewindError;
use crate::domain::ledger::Trade;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct ConsoleReport;

impl ConsoleReport {
    pub fn new() -> Self {
        ConsoleReport
    }
}

impl ReportPort for ConsoleReport {
    fn on_backtest(&self, result: &BacktestResult) -> Result<(), TradewindError> {
        let m = &result.metrics;

        eprintln!("\n=== Backtest Results ===");
        eprintln!("Final Equity:     {:.2}", m.final_equity);
        eprintln!("Return:           {:.2}%", m.returns_pct);
        eprintln!("Max Drawdown:     -{:.2}%", m.max_drawdown_pct);
        eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
        eprintln!("Total Trades:     {}", m.total_trades);
        eprintln!(
            "Closed Trades:    {} ({} won / {} lost)",
            m.closed_trades, m.trades_won, m.trades_lost
        );
        eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
        if m.profit_factor.is_infinite() {
            eprintln!("Profit Factor:    inf (no losing trades)");
        } else {
            eprintln!("Profit Factor:    {:.2}", m.profit_factor);
        }

        for trade in &result.trades {
            self.on_trade(trade)?;
        }
        Ok(())
    }

    fn on_trade(&self, trade: &Trade) -> Result<(), TradewindError> {
        println!(
            "{} {:>4} {:.6} @ {:.2} = {:.2} ({})",
            trade.timestamp.format("%Y-%m-%d %H:%M:%S"),
            trade.side.to_string(),
            trade.quantity,
            trade.price,
            trade.value,
            trade.reason,
        );
        Ok(())
    }
}
