//! OHLCV bars, the append-only bar series, and tick ingestion.
//!
//! `BarSeries` keeps two slots: a committed, append-only vector and a
//! single tentative bar that accumulates ticks for the minute currently
//! in progress. The tentative bar is overwritten in place and moves into
//! the committed vector exactly once, when a tick from a later minute
//! arrives. Committed history is never popped.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::error::EmasweepError;

const TIMESTAMP_FMT_FRAC: &str = "%Y-%m-%dT%H:%M:%S%.f";
const TIMESTAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// One committed OHLCV bar. `index` is the stable position in the series,
/// `timestamp` the Unix time of the period start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub index: usize,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A single trade execution from the market-data feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub size: f64,
}

impl Tick {
    /// Parse a tick whose timestamp may or may not carry fractional seconds.
    pub fn parse(timestamp: &str, price: f64, size: f64) -> Result<Self, EmasweepError> {
        let timestamp = parse_timestamp(timestamp)?;
        Ok(Tick {
            timestamp,
            price,
            size,
        })
    }
}

/// Parse an ISO-8601 timestamp, accepting both `2024-01-15T09:30:00.123`
/// and `2024-01-15T09:30:00`.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, EmasweepError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT_FRAC)
        .or_else(|_| NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT))
        .map_err(|e| EmasweepError::DataFormat {
            reason: format!("invalid timestamp '{s}': {e}"),
        })
}

/// Ordered, append-only collection of bars plus the in-progress minute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarSeries {
    committed: Vec<Bar>,
    tentative: Option<Bar>,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from already-closed bars, reindexing them in order.
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        let committed = bars
            .into_iter()
            .enumerate()
            .map(|(index, bar)| Bar { index, ..bar })
            .collect();
        BarSeries {
            committed,
            tentative: None,
        }
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.committed
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.committed.get(index)
    }

    pub fn tentative(&self) -> Option<&Bar> {
        self.tentative.as_ref()
    }

    /// Append a closed bar directly (batch loading path).
    pub fn push(&mut self, bar: Bar) {
        let index = self.committed.len();
        self.committed.push(Bar { index, ..bar });
    }

    /// Fold one tick into the series. Ticks inside the current minute
    /// mutate the tentative bar in place; the first tick of a later
    /// minute commits the tentative bar and starts a new one. Returns
    /// the bar that was committed, if any.
    pub fn apply_tick(&mut self, tick: &Tick) -> Option<Bar> {
        let period = minute_start(tick.timestamp);

        match self.tentative.take() {
            None => {
                self.tentative = Some(new_tentative(period, tick));
                None
            }
            Some(mut current) => {
                if period == current.timestamp {
                    current.high = current.high.max(tick.price);
                    current.low = current.low.min(tick.price);
                    current.close = tick.price;
                    current.volume += tick.size;
                    self.tentative = Some(current);
                    None
                } else {
                    let index = self.committed.len();
                    let committed = Bar { index, ..current };
                    self.committed.push(committed.clone());
                    self.tentative = Some(new_tentative(period, tick));
                    Some(committed)
                }
            }
        }
    }
}

fn new_tentative(period: i64, tick: &Tick) -> Bar {
    Bar {
        index: 0, // assigned on commit
        timestamp: period,
        open: tick.price,
        high: tick.price,
        low: tick.price,
        close: tick.price,
        volume: tick.size,
    }
}

fn minute_start(ts: NaiveDateTime) -> i64 {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
        .and_utc()
        .timestamp()
}
