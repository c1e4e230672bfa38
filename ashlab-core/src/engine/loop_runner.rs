//! Backtest driver: threads a session through an ordered bar sequence.

use tracing::{debug, info};

use super::error::EngineError;
use super::state::{EngineConfig, RunResult, SessionState};
use crate::domain::{Bar, PlSeries};
use crate::signals::{HeikinAshiTrend, SignalGenerator};

/// Run a backtest with the Heikin-Ashi trend signal.
///
/// `bars` must be one trading day in ascending timestamp order. The result
/// carries exactly one PL point per input bar, in input order; any error
/// aborts the run and no series is returned.
pub fn run_backtest(bars: &[Bar], config: &EngineConfig) -> Result<RunResult, EngineError> {
    run_backtest_with(bars, config, HeikinAshiTrend::new())
}

/// Run a backtest with a caller-supplied signal generator.
pub fn run_backtest_with<G: SignalGenerator>(
    bars: &[Bar],
    config: &EngineConfig,
    signal: G,
) -> Result<RunResult, EngineError> {
    if bars.is_empty() {
        return Err(EngineError::EmptyInput);
    }

    let mut state = SessionState::with_signal(config, signal);
    let mut series = PlSeries::with_capacity(bars.len());
    debug!(
        symbol = %config.symbol,
        date = %config.window.date(),
        bars = bars.len(),
        signal = state.signal_name(),
        "starting session"
    );

    for bar in bars {
        series.push(state.step(bar)?);
    }

    let result = state.into_result(series);
    info!(
        symbol = %config.symbol,
        date = %config.window.date(),
        final_pl = result.final_pl(),
        locked_pl = result.ledger.locked_pl,
        trades = result.ledger.trade_count,
        "session complete"
    );
    Ok(result)
}

/// PL series only; see [`run_backtest`].
pub fn run(bars: &[Bar], config: &EngineConfig) -> Result<PlSeries, EngineError> {
    run_backtest(bars, config).map(|result| result.pl_series)
}
