//! Moving Average Convergence Divergence indicator.
//!
//! line      = EMA(fast) - EMA(slow)
//! signal    = EMA(line, signal_period), computed over the defined
//!             sub-series of the line
//! histogram = line - signal
//!
//! Default parameters: fast=12, slow=26, signal=9. Because the EMA is
//! defined from index 0, all three series are too.

use super::ema::ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let len = closes.len();
    if fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            line: vec![None; len],
            signal: vec![None; len],
            histogram: vec![None; len],
        };
    }

    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    // Smooth only the defined tail of the line, then align the result
    // back onto the full index range.
    let offset = line.iter().position(|v| v.is_some()).unwrap_or(len);
    let defined: Vec<f64> = line[offset..].iter().map(|v| v.unwrap_or(0.0)).collect();
    let smoothed = ema(&defined, signal_period);

    let mut signal = vec![None; len];
    for (i, value) in smoothed.into_iter().enumerate() {
        signal[offset + i] = value;
    }

    let histogram: Vec<Option<f64>> = line
        .iter()
        .zip(signal.iter())
        .map(|(l, s)| match (l, s) {
            (Some(l), Some(s)) => Some(l - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}

pub fn macd_default(closes: &[f64]) -> MacdSeries {
    macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_defined_from_index_zero() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let series = macd_default(&closes);

        assert!(series.line.iter().all(|v| v.is_some()));
        assert!(series.signal.iter().all(|v| v.is_some()));
        assert!(series.histogram.iter().all(|v| v.is_some()));
    }

    #[test]
    fn macd_line_is_fast_minus_slow() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 7) as f64).collect();
        let series = macd(&closes, 3, 5, 2);

        let fast = ema(&closes, 3);
        let slow = ema(&closes, 5);
        for i in 0..closes.len() {
            let expected = fast[i].unwrap() - slow[i].unwrap();
            assert!(
                (series.line[i].unwrap() - expected).abs() < f64::EPSILON,
                "line mismatch at index {}",
                i
            );
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 9) as f64 * 1.5).collect();
        let series = macd_default(&closes);

        for i in 0..closes.len() {
            let expected = series.line[i].unwrap() - series.signal[i].unwrap();
            assert!((series.histogram[i].unwrap() - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn macd_flat_series_is_zero_everywhere() {
        let closes = [100.0; 40];
        let series = macd_default(&closes);

        for i in 0..closes.len() {
            assert!(series.line[i].unwrap().abs() < 1e-9);
            assert!(series.histogram[i].unwrap().abs() < 1e-9);
        }
    }

    #[test]
    fn macd_zero_parameter_is_all_undefined() {
        let closes = [100.0, 101.0, 102.0];
        for (fast, slow, signal) in [(0, 26, 9), (12, 0, 9), (12, 26, 0)] {
            let series = macd(&closes, fast, slow, signal);
            assert!(series.line.iter().all(|v| v.is_none()));
            assert!(series.signal.iter().all(|v| v.is_none()));
            assert!(series.histogram.iter().all(|v| v.is_none()));
        }
    }

    #[test]
    fn macd_empty_series() {
        let series = macd_default(&[]);
        assert!(series.line.is_empty());
        assert!(series.signal.is_empty());
        assert!(series.histogram.is_empty());
    }
}
