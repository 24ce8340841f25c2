//! Ensemble combiner: a weighted vote over the primitive strategies.
//!
//! Signals are grouped by bar index; buy and sell strengths are summed
//! separately. A consensus signal is emitted only when the winning
//! score reaches the threshold and strictly beats the opposing score.
//! Ties and sub-threshold indices emit nothing.

use std::collections::BTreeMap;

use super::signal::{Direction, Signal};
use super::strategy::TOTAL_VOTE_WEIGHT;

pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Reduce pooled per-strategy signals to at most one consensus signal
/// per index, sorted ascending. The consensus strength is the winning
/// score normalized by the total vote weight.
pub fn combine(signals: &[Signal], threshold: f64) -> Vec<Signal> {
    let mut scores: BTreeMap<usize, (f64, f64)> = BTreeMap::new();
    for signal in signals {
        let entry = scores.entry(signal.index).or_insert((0.0, 0.0));
        match signal.direction {
            Direction::Buy => entry.0 += signal.strength,
            Direction::Sell => entry.1 += signal.strength,
        }
    }

    scores
        .into_iter()
        .filter_map(|(index, (buy, sell))| {
            if buy >= threshold && buy > sell {
                Some(Signal::buy(index, normalize(buy)))
            } else if sell >= threshold && sell > buy {
                Some(Signal::sell(index, normalize(sell)))
            } else {
                None
            }
        })
        .collect()
}

fn normalize(score: f64) -> f64 {
    (score / TOTAL_VOTE_WEIGHT).min(1.0)
}
