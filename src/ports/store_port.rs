//! Persistence store port trait.
//!
//! A simple key-value contract: last write wins, read-your-writes
//! within a session. Nothing stronger (durability, transactions across
//! keys) is assumed by the engines.

use crate::domain::error::TradewindError;
use crate::domain::ledger::{Ledger, Trade};
use crate::domain::settings::LiveSettings;

pub trait StorePort: Send + Sync {
    fn load_settings(&self) -> Result<Option<LiveSettings>, TradewindError>;
    fn save_settings(&self, settings: &LiveSettings) -> Result<(), TradewindError>;

    fn load_ledger(&self) -> Result<Option<Ledger>, TradewindError>;
    fn save_ledger(&self, ledger: &Ledger) -> Result<(), TradewindError>;

    /// Append one trade to the history log. The log is append-only;
    /// trades are never rewritten.
    fn append_trade(&self, trade: &Trade) -> Result<(), TradewindError>;
    fn load_trade_history(&self) -> Result<Vec<Trade>, TradewindError>;
}
