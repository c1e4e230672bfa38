//! Backtesting engine: bar-by-bar session loop and PL accounting.
//!
//! Per bar after the first:
//!
//! 1. Smooth: raw bar + previous candle -> Heikin-Ashi candle
//! 2. Signal: candle + current direction -> {-1, 0, +1}
//! 3. Gate: session window -> allowed size
//! 4. Trade: open, flip or hold; re-mark current PL

pub mod account;
pub mod error;
pub mod loop_runner;
pub mod state;

pub use account::{Account, TradeOutcome};
pub use error::EngineError;
pub use loop_runner::{run, run_backtest, run_backtest_with};
pub use state::{EngineConfig, RunResult, SessionState};
