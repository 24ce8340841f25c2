//! Market data port trait.
//!
//! Implementations wrap whatever actually serves price bars: a CSV
//! replay file, an exchange REST proxy, a streaming cache. They must
//! normalize bars to chronological ascending order and bound any
//! network call with a timeout of their own; a timeout or upstream
//! error surfaces as [`TradewindError::DataUnavailable`], which the
//! engines treat as "no new data this tick".

use crate::domain::bar::PriceBar;
use crate::domain::error::TradewindError;

pub trait MarketDataPort: Send + Sync {
    /// The most recent bar for an instrument.
    fn latest_bar(&self, instrument: &str) -> Result<PriceBar, TradewindError>;

    /// Up to `count` most recent bars, chronologically ascending.
    fn historical_bars(
        &self,
        instrument: &str,
        count: usize,
    ) -> Result<Vec<PriceBar>, TradewindError>;
}
