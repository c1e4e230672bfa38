//! Heikin-Ashi candle smoothing.
//!
//! close' = (O + H + L + C) / 4 of the raw bar
//! open'  = (open + close) / 2 of the previous smoothed candle
//! high'  = max(O, H, C) of the raw bar
//! low'   = min(O, L, C) of the raw bar
//!
//! The first bar of a session has no predecessor and is seeded with its own
//! raw OHLC via [`SmoothedCandle::seed`].

use crate::domain::{Bar, InvalidBar, SmoothedCandle};

/// Smooth one raw bar against the previous smoothed candle.
pub fn smooth(bar: &Bar, prev: &SmoothedCandle) -> Result<SmoothedCandle, InvalidBar> {
    bar.validate()?;
    Ok(SmoothedCandle {
        timestamp: bar.timestamp,
        open: (prev.open + prev.close) / 2.0,
        high: bar.open.max(bar.high).max(bar.close),
        low: bar.open.min(bar.low).min(bar.close),
        close: (bar.open + bar.high + bar.low + bar.close) / 4.0,
    })
}

/// Incremental smoother that carries the previous candle between bars.
#[derive(Debug, Clone, Default)]
pub struct HeikinAshi {
    prev: Option<SmoothedCandle>,
}

impl HeikinAshi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next raw bar.
    ///
    /// The first bar only seeds the smoother and yields `None`; every later
    /// bar yields its smoothed candle, which becomes the next predecessor.
    pub fn update(&mut self, bar: &Bar) -> Result<Option<SmoothedCandle>, InvalidBar> {
        match self.prev {
            None => {
                bar.validate()?;
                self.prev = Some(SmoothedCandle::seed(bar));
                Ok(None)
            }
            Some(prev) => {
                let candle = smooth(bar, &prev)?;
                self.prev = Some(candle);
                Ok(Some(candle))
            }
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.prev.is_some()
    }

    pub fn previous(&self) -> Option<&SmoothedCandle> {
        self.prev.as_ref()
    }
}

/// Smooth a full bar sequence. Index 0 is the seed candle itself.
pub fn smooth_series(bars: &[Bar]) -> Result<Vec<SmoothedCandle>, InvalidBar> {
    let mut out = Vec::with_capacity(bars.len());
    let Some(first) = bars.first() else {
        return Ok(out);
    };
    first.validate()?;
    let mut prev = SmoothedCandle::seed(first);
    out.push(prev);
    for bar in &bars[1..] {
        prev = smooth(bar, &prev)?;
        out.push(prev);
    }
    Ok(out)
}
