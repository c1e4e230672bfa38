//! Session runner: wires together config, bar loading, engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: resolves the session date, loads bars, runs. Used by the CLI.
//! - `run_sessions()`: one independent session per date, fanned out over rayon.

use ashlab_core::data::{BarSource, DataSource};
use ashlab_core::domain::{Ledger, PlSeries, Position, TradeRecord};
use ashlab_core::engine::{run_backtest, EngineConfig, EngineError};
use ashlab_core::session::SessionWindow;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_session, resolve_session_date, LoadError, LoadedSession};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one session run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub date: NaiveDate,
    pub window: SessionWindow,
    pub data_source: DataSource,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub metrics: PerformanceMetrics,
    pub pl_series: PlSeries,
    pub trades: Vec<TradeRecord>,
    pub ledger: Ledger,
    /// Position still open after the last bar.
    pub final_position: Position,
    pub signal_name: String,
    pub signal_count: usize,
    pub bar_count: usize,
    /// Bars replayed outside the session window (never traded).
    #[serde(default)]
    pub outside_window_bars: usize,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run one session for the configured symbol.
///
/// The date comes from `date`, then `[backtest].date`, then the first day
/// `source` holds for the symbol.
pub fn run_single_backtest(
    config: &BacktestConfig,
    source: &dyn BarSource,
    date: Option<NaiveDate>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let date = resolve_session_date(source, config.symbol(), date, config.backtest.date)?;
    run_session(config, source, date)
}

/// Run one session per date in parallel.
///
/// Sessions share nothing, so each date is independent; results come back in
/// the order of `dates`. A failing date does not stop the others.
pub fn run_sessions(
    config: &BacktestConfig,
    source: &dyn BarSource,
    dates: &[NaiveDate],
) -> Result<Vec<Result<BacktestResult, RunError>>, RunError> {
    config.validate()?;
    let results: Vec<_> = dates
        .par_iter()
        .map(|&date| run_session(config, source, date))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(
        symbol = config.symbol(),
        sessions = dates.len(),
        failed,
        "multi-session run complete"
    );
    Ok(results)
}

fn run_session(
    config: &BacktestConfig,
    source: &dyn BarSource,
    date: NaiveDate,
) -> Result<BacktestResult, RunError> {
    let engine_config = config.engine_config(date);
    let loaded = load_session(source, config.symbol(), &engine_config.window)?;
    run_backtest_from_data(config, &loaded, engine_config.window)
}

/// Run a session over pre-loaded bars without any I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    loaded: &LoadedSession,
    window: SessionWindow,
) -> Result<BacktestResult, RunError> {
    let engine_config = EngineConfig::new(config.symbol(), window);
    let result = run_backtest(&loaded.bars, &engine_config)?;
    let metrics = PerformanceMetrics::compute(&result.pl_series.values(), &result.trades);

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        symbol: engine_config.symbol,
        date: window.date(),
        window,
        data_source: loaded.source,
        dataset_hash: loaded.dataset_hash.clone(),
        has_synthetic: loaded.has_synthetic,
        metrics,
        pl_series: result.pl_series,
        trades: result.trades,
        ledger: result.ledger,
        final_position: result.position,
        signal_name: result.signal_name,
        signal_count: result.signal_count,
        bar_count: result.bar_count,
        outside_window_bars: loaded.outside_window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::SyntheticSource;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 2, 22).unwrap()
    }

    #[test]
    fn synthetic_session_is_tagged_and_consistent() {
        let config = BacktestConfig::for_symbol("AAPL");
        let result =
            run_single_backtest(&config, &SyntheticSource::default(), Some(day())).unwrap();

        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert!(result.has_synthetic);
        assert_eq!(result.data_source, DataSource::Synthetic);
        assert_eq!(result.bar_count, 390);
        assert_eq!(result.pl_series.len(), 390);
        assert_eq!(result.metrics.trade_count, result.trades.len());
        assert_eq!(result.metrics.final_pl, result.ledger.current_pl);
        assert_eq!(result.run_id, config.run_id());
    }

    #[test]
    fn invalid_config_is_rejected_before_loading() {
        let mut config = BacktestConfig::for_symbol("AAPL");
        config.session.unit_size = 0;
        assert!(matches!(
            run_single_backtest(&config, &SyntheticSource::default(), Some(day())),
            Err(RunError::Config(_))
        ));
    }

    #[test]
    fn missing_date_without_source_dates_fails() {
        let config = BacktestConfig::for_symbol("AAPL");
        assert!(matches!(
            run_single_backtest(&config, &SyntheticSource::default(), None),
            Err(RunError::Data(LoadError::NoSessionDate { .. }))
        ));
    }
}
