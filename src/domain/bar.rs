//! Price bar representation.
//!
//! `close` is the only mandatory field; open/high/low/volume depend on
//! the fidelity of the data source. Series are ordered strictly by
//! timestamp with no duplicates and are append-only within a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceBar {
    /// Bar carrying only a close, as produced by ticker-style feeds.
    pub fn from_close(timestamp: DateTime<Utc>, close: f64) -> Self {
        PriceBar {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    /// High, falling back to close where the source supplied none.
    pub fn high_or_close(&self) -> f64 {
        self.high.unwrap_or(self.close)
    }

    /// Low, falling back to close where the source supplied none.
    pub fn low_or_close(&self) -> f64 {
        self.low.unwrap_or(self.close)
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let high = self.high_or_close();
        let low = self.low_or_close();
        let hl = high - low;
        let hc = (high - prev_close).abs();
        let lc = (low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Extract the close series from a slice of bars.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            open: Some(100.0),
            high: Some(110.0),
            low: Some(90.0),
            close: 105.0,
            volume: Some(50_000.0),
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |110-100|=10, |90-100|=10 -> 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 -> 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=20, |110-130|=20, |90-130|=40 -> 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_close_only_bar() {
        let bar = PriceBar::from_close(
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            105.0,
        );
        // high and low collapse to close: max(0, 5, 5) = 5
        assert!((bar.true_range(100.0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn closes_extracts_series() {
        let bars = vec![
            PriceBar::from_close(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 100.0),
            PriceBar::from_close(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(), 102.0),
        ];
        assert_eq!(closes(&bars), vec![100.0, 102.0]);
    }
}
