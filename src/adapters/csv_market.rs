//! CSV-backed market data adapter.
//!
//! Serves bars from a CSV file both as history and as a deterministic
//! replay feed: `historical_bars` hands out rows from the front of the
//! file and positions a cursor, and each `latest_bar` call yields the
//! next row. An exhausted file reports `DataUnavailable`, which a live
//! session treats like any other feed dropout. Network-backed feeds
//! implement the same port elsewhere.
//!
//! Expected columns: `timestamp,open,high,low,close,volume` (full) or
//! `timestamp,close` (close-only). Timestamps are RFC 3339, or a bare
//! `YYYY-MM-DD` taken as midnight UTC. Rows are sorted and
//! de-duplicated by timestamp on load.

use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;
use std::sync::Mutex;

use crate::domain::bar::PriceBar;
use crate::domain::error::TradewindError;
use crate::ports::market_port::MarketDataPort;

pub struct CsvMarketData {
    bars: Vec<PriceBar>,
    cursor: Mutex<usize>,
}

impl CsvMarketData {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradewindError> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| TradewindError::Csv {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        let mut bars = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| TradewindError::Csv {
                reason: format!("row {}: {}", row + 1, e),
            })?;
            bars.push(parse_record(&record, row + 1)?);
        }

        Ok(Self::from_bars(bars))
    }

    pub fn from_bars(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        CsvMarketData {
            bars,
            cursor: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

impl MarketDataPort for CsvMarketData {
    fn latest_bar(&self, _instrument: &str) -> Result<PriceBar, TradewindError> {
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        match self.bars.get(*cursor) {
            Some(bar) => {
                *cursor += 1;
                Ok(bar.clone())
            }
            None => Err(TradewindError::DataUnavailable {
                reason: "replay feed exhausted".to_string(),
            }),
        }
    }

    fn historical_bars(
        &self,
        _instrument: &str,
        count: usize,
    ) -> Result<Vec<PriceBar>, TradewindError> {
        let take = count.min(self.bars.len());
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        if *cursor < take {
            *cursor = take;
        }
        Ok(self.bars[..take].to_vec())
    }
}

fn parse_record(record: &csv::StringRecord, row: usize) -> Result<PriceBar, TradewindError> {
    let field = |idx: usize, name: &str| {
        record
            .get(idx)
            .map(str::trim)
            .ok_or_else(|| TradewindError::Csv {
                reason: format!("row {row}: missing {name} column"),
            })
    };
    let parse_f64 = |value: &str, name: &str| {
        value.parse::<f64>().map_err(|_| TradewindError::Csv {
            reason: format!("row {row}: invalid {name} value '{value}'"),
        })
    };
    let optional_f64 = |idx: usize, name: &str| -> Result<Option<f64>, TradewindError> {
        match record.get(idx).map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_f64(value, name).map(Some),
        }
    };

    let timestamp = parse_timestamp(field(0, "timestamp")?, row)?;

    let bar = match record.len() {
        2 => PriceBar::from_close(timestamp, parse_f64(field(1, "close")?, "close")?),
        6 => PriceBar {
            timestamp,
            open: optional_f64(1, "open")?,
            high: optional_f64(2, "high")?,
            low: optional_f64(3, "low")?,
            close: parse_f64(field(4, "close")?, "close")?,
            volume: optional_f64(5, "volume")?,
        },
        n => {
            return Err(TradewindError::Csv {
                reason: format!("row {row}: expected 2 or 6 columns, found {n}"),
            })
        }
    };

    Ok(bar)
}

fn parse_timestamp(value: &str, row: usize) -> Result<DateTime<Utc>, TradewindError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(TradewindError::Csv {
        reason: format!("row {row}: invalid timestamp '{value}'"),
    })
}
