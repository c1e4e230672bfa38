//! Signal generation: maps a smoothed candle to a trade decision.
//!
//! Unlike a pure market-timing signal, the decision here depends on the side
//! of the open position: a generator never asks to re-enter the side it is
//! already on. It sees the position's direction only, never prices or PL.

pub mod heikin_ashi_trend;
pub mod intent;

pub use heikin_ashi_trend::HeikinAshiTrend;
pub use intent::{Signal, SignalOutOfRange};

use crate::domain::{Direction, SmoothedCandle};

/// Per-bar signal generator.
///
/// # Invariants
/// - `evaluate()` MUST be deterministic for the same inputs
/// - `evaluate()` sees the candle and the current direction, nothing else
pub trait SignalGenerator: Send + Sync {
    /// Signal name for logging and result reports.
    fn name(&self) -> &str;

    /// Decide the signal for `candle` given the open position's direction.
    fn evaluate(&self, candle: &SmoothedCandle, current: Direction) -> Signal;
}
