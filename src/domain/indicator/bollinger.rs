//! Bollinger Bands indicator.
//!
//! middle = SMA(period); band = k * population standard deviation of
//! the trailing window; upper/lower = middle +/- band. Undefined until
//! a full window is available, like the SMA.

use super::sma::sma;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_K: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn bollinger(closes: &[f64], period: usize, k: f64) -> BollingerSeries {
    let len = closes.len();
    if period == 0 {
        return BollingerSeries {
            upper: vec![None; len],
            middle: vec![None; len],
            lower: vec![None; len],
        };
    }

    let middle = sma(closes, period);
    let mut upper = vec![None; len];
    let mut lower = vec![None; len];

    for i in (period - 1)..len {
        let mean = match middle[i] {
            Some(m) => m,
            None => continue,
        };
        let window = &closes[i + 1 - period..=i];
        let variance =
            window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / period as f64;
        let band = k * variance.sqrt();
        upper[i] = Some(mean + band);
        lower[i] = Some(mean - band);
    }

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}

pub fn bollinger_default(closes: &[f64]) -> BollingerSeries {
    bollinger(closes, DEFAULT_PERIOD, DEFAULT_K)
}
