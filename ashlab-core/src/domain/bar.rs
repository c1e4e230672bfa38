//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One-minute OHLCV bar for a single instrument.
///
/// `timestamp` is the exchange-local wall clock at the start of the minute.
/// Sources that deliver epoch timestamps convert them before building a `Bar`
/// (see [`crate::data::provider::RawCandle::to_bar`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    /// Name of the first OHLC field that is NaN or infinite, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }

    /// Reject bars with a NaN or infinite OHLC field.
    pub fn validate(&self) -> Result<(), InvalidBar> {
        match self.non_finite_field() {
            Some(field) => Err(InvalidBar {
                timestamp: self.timestamp,
                field,
            }),
            None => Ok(()),
        }
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.non_finite_field().is_some() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// A bar whose OHLC values cannot be smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid bar at {timestamp}: {field} is not a finite number")]
pub struct InvalidBar {
    pub timestamp: NaiveDateTime,
    pub field: &'static str,
}
