//! Strategy identities and per-strategy signal generators.
//!
//! Every generator scans its indicator series and emits a signal only
//! at the exact index where a qualifying transition occurs, which
//! keeps a trending series from flooding the decision layer with one
//! signal per bar. A transition needs the indicator defined at both
//! the previous and the current index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::bar::{closes, PriceBar};
use super::ensemble;
use super::indicator::{atr, bollinger_default, macd_default, rsi, sma};
use super::indicator::{atr::DEFAULT_PERIOD as ATR_PERIOD, rsi::DEFAULT_PERIOD as RSI_PERIOD};
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    SmaCross,
    RsiReversal,
    MacdCross,
    BollingerBreakout,
    AtrBreakout,
    Ensemble,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::SmaCross => "sma_cross",
            StrategyKind::RsiReversal => "rsi_reversal",
            StrategyKind::MacdCross => "macd_cross",
            StrategyKind::BollingerBreakout => "bollinger_breakout",
            StrategyKind::AtrBreakout => "atr_breakout",
            StrategyKind::Ensemble => "ensemble",
        };
        write!(f, "{name}")
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sma_cross" => Ok(StrategyKind::SmaCross),
            "rsi_reversal" => Ok(StrategyKind::RsiReversal),
            "macd_cross" => Ok(StrategyKind::MacdCross),
            "bollinger_breakout" => Ok(StrategyKind::BollingerBreakout),
            "atr_breakout" => Ok(StrategyKind::AtrBreakout),
            "ensemble" => Ok(StrategyKind::Ensemble),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

// Fixed per-strategy vote weights, consumed only by the ensemble.
pub const RSI_REVERSAL_WEIGHT: f64 = 0.8;
pub const MACD_CROSS_WEIGHT: f64 = 0.75;
pub const SMA_CROSS_WEIGHT: f64 = 0.7;
pub const BOLLINGER_BREAKOUT_WEIGHT: f64 = 0.65;
pub const ATR_BREAKOUT_WEIGHT: f64 = 0.6;

/// Sum of all primitive weights; normalizes ensemble scores into [0, 1].
pub const TOTAL_VOTE_WEIGHT: f64 = RSI_REVERSAL_WEIGHT
    + MACD_CROSS_WEIGHT
    + SMA_CROSS_WEIGHT
    + BOLLINGER_BREAKOUT_WEIGHT
    + ATR_BREAKOUT_WEIGHT;

pub const SMA_FAST_PERIOD: usize = 5;
pub const SMA_SLOW_PERIOD: usize = 10;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const ATR_CHANNEL_SMA_PERIOD: usize = 20;
pub const ATR_CHANNEL_MULT: f64 = 1.5;

/// Signals for one strategy over a full series, sorted by index.
pub fn generate_signals(
    kind: StrategyKind,
    bars: &[PriceBar],
    ensemble_threshold: f64,
) -> Vec<Signal> {
    match kind {
        StrategyKind::SmaCross => sma_cross_signals(bars),
        StrategyKind::RsiReversal => rsi_reversal_signals(bars),
        StrategyKind::MacdCross => macd_cross_signals(bars),
        StrategyKind::BollingerBreakout => bollinger_breakout_signals(bars),
        StrategyKind::AtrBreakout => atr_breakout_signals(bars),
        StrategyKind::Ensemble => {
            ensemble::combine(&primitive_signals(bars), ensemble_threshold)
        }
    }
}

/// All primitive strategies' signals pooled together (ensemble input).
pub fn primitive_signals(bars: &[PriceBar]) -> Vec<Signal> {
    let mut signals = sma_cross_signals(bars);
    signals.extend(rsi_reversal_signals(bars));
    signals.extend(macd_cross_signals(bars));
    signals.extend(bollinger_breakout_signals(bars));
    signals.extend(atr_breakout_signals(bars));
    signals
}

/// Buy when the fast SMA crosses from <= to > the slow SMA; sell on
/// the reverse cross.
pub fn sma_cross_signals(bars: &[PriceBar]) -> Vec<Signal> {
    let series = closes(bars);
    let fast = sma(&series, SMA_FAST_PERIOD);
    let slow = sma(&series, SMA_SLOW_PERIOD);

    let mut signals = Vec::new();
    for i in 1..bars.len() {
        let (Some(pf), Some(f), Some(ps), Some(s)) = (fast[i - 1], fast[i], slow[i - 1], slow[i])
        else {
            continue;
        };

        if pf <= ps && f > s {
            signals.push(Signal::buy(i, SMA_CROSS_WEIGHT));
        } else if pf >= ps && f < s {
            signals.push(Signal::sell(i, SMA_CROSS_WEIGHT));
        }
    }
    signals
}

/// Buy when the RSI crosses up through the oversold line; sell when
/// it crosses down through the overbought line.
pub fn rsi_reversal_signals(bars: &[PriceBar]) -> Vec<Signal> {
    let series = rsi(&closes(bars), RSI_PERIOD);

    let mut signals = Vec::new();
    for i in 1..bars.len() {
        let (Some(prev), Some(curr)) = (series[i - 1], series[i]) else {
            continue;
        };

        if prev <= RSI_OVERSOLD && curr > RSI_OVERSOLD {
            signals.push(Signal::buy(i, RSI_REVERSAL_WEIGHT));
        } else if prev >= RSI_OVERBOUGHT && curr < RSI_OVERBOUGHT {
            signals.push(Signal::sell(i, RSI_REVERSAL_WEIGHT));
        }
    }
    signals
}

/// Buy when the MACD histogram crosses from <= 0 to > 0; sell on the
/// reverse.
pub fn macd_cross_signals(bars: &[PriceBar]) -> Vec<Signal> {
    let series = macd_default(&closes(bars));

    let mut signals = Vec::new();
    for i in 1..bars.len() {
        let (Some(prev), Some(curr)) = (series.histogram[i - 1], series.histogram[i]) else {
            continue;
        };

        if prev <= 0.0 && curr > 0.0 {
            signals.push(Signal::buy(i, MACD_CROSS_WEIGHT));
        } else if prev >= 0.0 && curr < 0.0 {
            signals.push(Signal::sell(i, MACD_CROSS_WEIGHT));
        }
    }
    signals
}

/// Mean-reversion entry: buy when price crosses below the lower band,
/// sell when it crosses above the upper band.
pub fn bollinger_breakout_signals(bars: &[PriceBar]) -> Vec<Signal> {
    let series = closes(bars);
    let bands = bollinger_default(&series);

    let mut signals = Vec::new();
    for i in 1..bars.len() {
        let (Some(pl), Some(l), Some(pu), Some(u)) = (
            bands.lower[i - 1],
            bands.lower[i],
            bands.upper[i - 1],
            bands.upper[i],
        ) else {
            continue;
        };
        let (pc, c) = (series[i - 1], series[i]);

        if pc >= pl && c < l {
            signals.push(Signal::buy(i, BOLLINGER_BREAKOUT_WEIGHT));
        } else if pc <= pu && c > u {
            signals.push(Signal::sell(i, BOLLINGER_BREAKOUT_WEIGHT));
        }
    }
    signals
}

/// Momentum entry on a volatility channel (SMA +/- mult * ATR): buy on
/// a break above the upper channel, sell on a break below the lower.
pub fn atr_breakout_signals(bars: &[PriceBar]) -> Vec<Signal> {
    let series = closes(bars);
    let mid = sma(&series, ATR_CHANNEL_SMA_PERIOD);
    let range = atr(bars, ATR_PERIOD);

    let mut signals = Vec::new();
    for i in 1..bars.len() {
        let (Some(pm), Some(m), Some(pr), Some(r)) =
            (mid[i - 1], mid[i], range[i - 1], range[i])
        else {
            continue;
        };
        let (pc, c) = (series[i - 1], series[i]);
        let (prev_upper, upper) = (pm + ATR_CHANNEL_MULT * pr, m + ATR_CHANNEL_MULT * r);
        let (prev_lower, lower) = (pm - ATR_CHANNEL_MULT * pr, m - ATR_CHANNEL_MULT * r);

        if pc <= prev_upper && c > upper {
            signals.push(Signal::buy(i, ATR_BREAKOUT_WEIGHT));
        } else if pc >= prev_lower && c < lower {
            signals.push(Signal::sell(i, ATR_BREAKOUT_WEIGHT));
        }
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Direction;
    use chrono::{Duration, TimeZone, Utc};

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                PriceBar::from_close(
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                        + Duration::hours(i as i64),
                    close,
                )
            })
            .collect()
    }

    fn make_ohlc_bars(rows: &[(f64, f64, f64)]) -> Vec<PriceBar> {
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| PriceBar {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + Duration::hours(i as i64),
                open: Some(close),
                high: Some(high),
                low: Some(low),
                close,
                volume: None,
            })
            .collect()
    }

    #[test]
    fn strategy_kind_round_trips_through_strings() {
        for kind in [
            StrategyKind::SmaCross,
            StrategyKind::RsiReversal,
            StrategyKind::MacdCross,
            StrategyKind::BollingerBreakout,
            StrategyKind::AtrBreakout,
            StrategyKind::Ensemble,
        ] {
            assert_eq!(kind.to_string().parse::<StrategyKind>(), Ok(kind));
        }
        assert!("momentum".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn flat_series_produces_no_signals() {
        let bars = make_bars(&[100.0; 60]);
        for kind in [
            StrategyKind::SmaCross,
            StrategyKind::RsiReversal,
            StrategyKind::MacdCross,
            StrategyKind::BollingerBreakout,
            StrategyKind::AtrBreakout,
            StrategyKind::Ensemble,
        ] {
            assert!(
                generate_signals(kind, &bars, ensemble::DEFAULT_THRESHOLD).is_empty(),
                "{kind} signalled on a flat series"
            );
        }
    }

    #[test]
    fn sma_cross_buys_once_at_the_turn() {
        // 12 bars falling, then 12 rising: the fast average overtakes
        // the slow one exactly once.
        let mut prices: Vec<f64> = (0..12).map(|i| 100.0 - i as f64).collect();
        prices.extend((1..=12).map(|i| 89.0 + i as f64 * 2.0));
        let signals = sma_cross_signals(&make_bars(&prices));

        let buys: Vec<_> = signals
            .iter()
            .filter(|s| s.direction == Direction::Buy)
            .collect();
        assert_eq!(buys.len(), 1);
        assert!(buys[0].index > SMA_SLOW_PERIOD);
        assert!((buys[0].strength - SMA_CROSS_WEIGHT).abs() < f64::EPSILON);
        assert!(signals
            .iter()
            .all(|s| s.direction != Direction::Sell || s.index < buys[0].index));
    }

    #[test]
    fn sma_cross_no_signal_on_monotone_series() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert!(sma_cross_signals(&make_bars(&prices)).is_empty());
    }

    #[test]
    fn rsi_reversal_buys_when_leaving_oversold() {
        // 20 falling bars push the RSI to the floor, one strong rise
        // lifts it back through 30.
        let mut prices: Vec<f64> = (0..21).map(|i| 100.0 - i as f64).collect();
        prices.push(prices[20] + 10.0);
        let signals = rsi_reversal_signals(&make_bars(&prices));

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Buy);
        assert_eq!(signals[0].index, 21);
        assert!((signals[0].strength - RSI_REVERSAL_WEIGHT).abs() < f64::EPSILON);
    }

    #[test]
    fn macd_cross_sells_into_decline_then_buys_the_recovery() {
        let mut prices: Vec<f64> = (0..13).map(|i| 100.0 - i as f64).collect();
        prices.extend((1..=14).map(|i| 88.0 + i as f64 * 2.0));
        let signals = macd_cross_signals(&make_bars(&prices));

        assert!(!signals.is_empty());
        assert_eq!(signals[0].direction, Direction::Sell);
        let buys: Vec<_> = signals
            .iter()
            .filter(|s| s.direction == Direction::Buy)
            .collect();
        assert_eq!(buys.len(), 1);
        assert!(buys[0].index > 13);
    }

    #[test]
    fn bollinger_buys_a_drop_through_the_lower_band() {
        let mut prices = vec![100.0; 25];
        prices.push(90.0);
        let signals = bollinger_breakout_signals(&make_bars(&prices));

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Buy);
        assert_eq!(signals[0].index, 25);
    }

    #[test]
    fn bollinger_sells_a_spike_through_the_upper_band() {
        let mut prices = vec![100.0; 25];
        prices.push(110.0);
        let signals = bollinger_breakout_signals(&make_bars(&prices));

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Sell);
        assert_eq!(signals[0].index, 25);
    }

    #[test]
    fn atr_breakout_buys_a_break_above_the_channel() {
        let mut rows: Vec<(f64, f64, f64)> = vec![(102.0, 98.0, 100.0); 22];
        rows.push((110.0, 106.0, 108.0));
        let signals = atr_breakout_signals(&make_ohlc_bars(&rows));

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Buy);
        assert_eq!(signals[0].index, 22);
    }

    #[test]
    fn atr_breakout_sells_a_break_below_the_channel() {
        let mut rows: Vec<(f64, f64, f64)> = vec![(102.0, 98.0, 100.0); 22];
        rows.push((94.0, 90.0, 92.0));
        let signals = atr_breakout_signals(&make_ohlc_bars(&rows));

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Sell);
        assert_eq!(signals[0].index, 22);
    }

    #[test]
    fn signals_are_sorted_and_unique_per_index() {
        let mut prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64 * 1.5).collect();
        prices.extend((1..=15).map(|i| 79.0 + i as f64 * 2.5));
        let bars = make_bars(&prices);

        for kind in [
            StrategyKind::SmaCross,
            StrategyKind::RsiReversal,
            StrategyKind::MacdCross,
            StrategyKind::BollingerBreakout,
            StrategyKind::AtrBreakout,
        ] {
            let signals = generate_signals(kind, &bars, ensemble::DEFAULT_THRESHOLD);
            for pair in signals.windows(2) {
                assert!(pair[0].index < pair[1].index, "{kind} duplicated an index");
            }
        }
    }
}
