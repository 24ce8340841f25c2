#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::io::Write;
use tempfile::NamedTempFile;

pub use tradewind::domain::bar::PriceBar;

pub fn ts(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64)
}

pub fn make_bar(i: usize, close: f64) -> PriceBar {
    PriceBar::from_close(ts(i), close)
}

pub fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(i, close))
        .collect()
}

/// Falls, recovers, falls again, then goes flat: one long round trip
/// for a moving-average cross strategy.
pub fn v_shaped_prices() -> Vec<f64> {
    let mut prices: Vec<f64> = (0..12).map(|i| 100.0 - i as f64).collect();
    prices.extend((1..=12).map(|i| 89.0 + i as f64 * 2.0));
    prices.extend((1..=12).map(|i| 113.0 - i as f64 * 2.5));
    prices.extend(std::iter::repeat(83.0).take(12));
    prices
}

/// Write an hourly close-only CSV series to a temp file.
pub fn write_price_csv(prices: &[f64]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "timestamp,close").unwrap();
    for (i, close) in prices.iter().enumerate() {
        writeln!(file, "{},{}", ts(i).to_rfc3339(), close).unwrap();
    }
    file.flush().unwrap();
    file
}
