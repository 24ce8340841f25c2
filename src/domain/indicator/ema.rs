//! Exponential Moving Average indicator.
//!
//! k = 2/(period+1), seeded with the first close and defined from
//! index 0. Unlike the SMA there is no warm-up gap: the EMA ramps up
//! gradually instead of waiting for a full window. That asymmetry is
//! deliberate and downstream code relies on it.

pub fn ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(closes.len());
    let mut current = 0.0;

    for (i, &close) in closes.iter().enumerate() {
        current = if i == 0 {
            close
        } else {
            close * k + current * (1.0 - k)
        };
        values.push(Some(current));
    }

    values
}
