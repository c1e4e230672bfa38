//! Candle transforms applied to raw bars before signal evaluation.

pub mod heikin_ashi;

pub use heikin_ashi::{smooth, smooth_series, HeikinAshi};

/// Create one-minute test bars from (open, high, low, close) tuples.
///
/// Bars start at 09:31 on 2021-02-22 and advance one minute each.
#[cfg(test)]
pub fn make_bars(ohlc: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let start = chrono::NaiveDate::from_ymd_opt(2021, 2, 22)
        .unwrap()
        .and_hms_opt(9, 31, 0)
        .unwrap();
    ohlc.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(
                start + chrono::Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
