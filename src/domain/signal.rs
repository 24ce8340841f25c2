//! Discrete trading signals.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// A directional event attached to exactly one bar index.
///
/// A strategy emits at most one signal per index, and only at the
/// index where a qualifying transition occurs, never on every bar
/// that happens to satisfy a static condition. `strength` is the
/// strategy's fixed vote weight in [0, 1], consumed by the ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub index: usize,
    pub direction: Direction,
    pub strength: f64,
}

impl Signal {
    pub fn buy(index: usize, strength: f64) -> Self {
        Signal {
            index,
            direction: Direction::Buy,
            strength,
        }
    }

    pub fn sell(index: usize, strength: f64) -> Self {
        Signal {
            index,
            direction: Direction::Sell,
            strength,
        }
    }
}
