use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Bar;

/// Heikin-Ashi candle derived from one raw bar and its smoothed predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedCandle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl SmoothedCandle {
    /// Predecessor for the first bar of a session: the raw bar's own OHLC.
    pub fn seed(bar: &Bar) -> Self {
        Self {
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}
