//! Average True Range indicator.
//!
//! True range per bar needs the previous close, so the series of true
//! ranges starts at index 1. The ATR seeds with a simple average of
//! the first `period` true ranges (first defined index: `period`) and
//! Wilder-smooths from there on.

use crate::domain::bar::PriceBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn atr(bars: &[PriceBar], period: usize) -> Vec<Option<f64>> {
    if period == 0 || bars.len() <= period {
        return vec![None; bars.len()];
    }

    let mut values = vec![None; bars.len()];
    let mut current = 0.0;

    for i in 1..bars.len() {
        let tr = bars[i].true_range(bars[i - 1].close);

        if i <= period {
            current += tr / period as f64;
            if i < period {
                continue;
            }
        } else {
            current = (current * (period - 1) as f64 + tr) / period as f64;
        }

        values[i] = Some(current);
    }

    values
}
