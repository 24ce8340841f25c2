//! Technical indicator implementations.
//!
//! Pure functions over close series (ATR additionally needs highs and
//! lows, so it takes whole bars). Every function returns a series
//! aligned index-for-index with its input; indices before an
//! indicator's lookback is satisfied hold `None`, never a fabricated
//! number.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::atr;
pub use bollinger::{bollinger, bollinger_default, BollingerSeries};
pub use ema::ema;
pub use macd::{macd, macd_default, MacdSeries};
pub use rsi::rsi;
pub use sma::sma;
