//! Bar source trait and structured error types.
//!
//! The BarSource trait abstracts over where a day of minute bars comes from
//! (CSV files, provider JSON dumps, synthetic generators) so the runner can
//! swap implementations and mock them in tests.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Raw minute candle as market-data providers deliver it: epoch milliseconds
/// plus OHLCV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
    /// Bar start, milliseconds since the Unix epoch.
    pub datetime: i64,
}

impl RawCandle {
    /// Convert to a [`Bar`] on the exchange-local clock given by `offset`.
    pub fn to_bar(&self, offset: FixedOffset) -> Result<Bar, DataError> {
        let timestamp = epoch_millis_to_local(self.datetime, offset)
            .ok_or(DataError::TimestampOutOfRange(self.datetime))?;
        Ok(Bar {
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

/// Epoch milliseconds to wall-clock time at `offset`.
pub fn epoch_millis_to_local(millis: i64, offset: FixedOffset) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&offset).naive_local())
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and log contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no bars for '{symbol}' on {date}")]
    NoBars { symbol: String, date: NaiveDate },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("timestamp {0} ms is out of range")]
    TimestampOutOfRange(i64),
}

/// Where a day of bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    CsvImport,
    PriceHistoryJson,
    Synthetic,
}

/// Trait for bar sources.
///
/// Implementations return one trading day of minute bars for a symbol,
/// sorted ascending by timestamp.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Provenance tag recorded with results.
    fn kind(&self) -> DataSource;

    /// Fetch one day of minute bars for `symbol`.
    fn fetch_daily_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, DataError>;

    /// Trading days this source holds for `symbol`, ascending.
    ///
    /// Sources that generate or download on demand return an empty list.
    fn available_dates(&self, _symbol: &str) -> Result<Vec<NaiveDate>, DataError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eastern() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    #[test]
    fn epoch_converts_to_exchange_clock() {
        // 2021-02-22 14:30:00 UTC == 09:30 EST
        let candle = RawCandle {
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 100.0,
            datetime: 1_614_004_200_000,
        };
        let bar = candle.to_bar(eastern()).unwrap();
        let expected = NaiveDate::from_ymd_opt(2021, 2, 22)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(bar.timestamp, expected);
        assert_eq!(bar.close, 1.5);
        assert_eq!(bar.volume, 100.0);
    }

    #[test]
    fn out_of_range_epoch_is_an_error() {
        let candle = RawCandle {
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
            datetime: i64::MAX,
        };
        assert!(matches!(
            candle.to_bar(eastern()),
            Err(DataError::TimestampOutOfRange(_))
        ));
    }

    #[test]
    fn raw_candle_parses_provider_json() {
        let json = r#"{"open":10.0,"high":11.0,"low":9.0,"close":10.5,"volume":1200,"datetime":1614004260000}"#;
        let candle: RawCandle = serde_json::from_str(json).unwrap();
        assert_eq!(candle.volume, 1200.0);
        assert_eq!(candle.datetime, 1_614_004_260_000);
    }
}
