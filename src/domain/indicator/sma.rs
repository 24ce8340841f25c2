//! Simple Moving Average indicator.
//!
//! Arithmetic mean of the trailing `period` closes. The first
//! `period - 1` indices have no full window and hold `None`.

pub fn sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut values = Vec::with_capacity(closes.len());
    let mut sum = 0.0;

    for (i, &close) in closes.iter().enumerate() {
        sum += close;
        if i >= period {
            sum -= closes[i - period];
        }
        if i + 1 >= period {
            values.push(Some(sum / period as f64));
        } else {
            values.push(None);
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sma_window_walk() {
        let series = sma(&[100.0, 102.0, 104.0, 103.0, 101.0], 2);
        assert_eq!(series[0], None);
        assert!((series[1].unwrap() - 101.0).abs() < f64::EPSILON);
        assert!((series[2].unwrap() - 103.0).abs() < f64::EPSILON);
        assert!((series[3].unwrap() - 103.5).abs() < f64::EPSILON);
        assert!((series[4].unwrap() - 102.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_warmup_length() {
        let series = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], None);
        assert_eq!(series[1], None);
        assert!(series[2].is_some());
    }

    #[test]
    fn sma_period_longer_than_series() {
        let series = sma(&[1.0, 2.0], 5);
        assert!(series.iter().all(|v| v.is_none()));
    }

    #[test]
    fn sma_period_zero_is_all_undefined() {
        let series = sma(&[1.0, 2.0, 3.0], 0);
        assert!(series.iter().all(|v| v.is_none()));
    }

    #[test]
    fn sma_empty_series() {
        assert!(sma(&[], 3).is_empty());
    }

    proptest! {
        #[test]
        fn sma_of_constant_series_is_the_constant(
            v in -1.0e6_f64..1.0e6,
            len in 1usize..60,
            period in 1usize..20,
        ) {
            let closes = vec![v; len];
            for value in sma(&closes, period).into_iter().flatten() {
                // relative tolerance: the rolling sum accumulates a few
                // ulps at large magnitudes
                prop_assert!((value - v).abs() <= 1e-9 * v.abs().max(1.0));
            }
        }
    }
}
