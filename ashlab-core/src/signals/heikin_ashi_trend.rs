//! Heikin-Ashi trend signal.
//!
//! Go long on a bullish smoothed candle, short on a bearish one, and hold
//! when already positioned on that side. A flat candle (close == open) never
//! trades, whatever the current position.

use tracing::trace;

use super::{Signal, SignalGenerator};
use crate::domain::{Direction, SmoothedCandle};

#[derive(Debug, Clone, Copy, Default)]
pub struct HeikinAshiTrend;

impl HeikinAshiTrend {
    pub fn new() -> Self {
        Self
    }
}

impl SignalGenerator for HeikinAshiTrend {
    fn name(&self) -> &str {
        "heikin_ashi_trend"
    }

    fn evaluate(&self, candle: &SmoothedCandle, current: Direction) -> Signal {
        let signal = if candle.is_bullish() {
            if current == Direction::Long {
                Signal::Hold
            } else {
                Signal::Long
            }
        } else if candle.is_bearish() && current != Direction::Short {
            Signal::Short
        } else {
            Signal::Hold
        };
        trace!(
            at = %candle.timestamp,
            open = candle.open,
            close = candle.close,
            ?current,
            signal = signal.as_i8(),
            "evaluated candle"
        );
        signal
    }
}
