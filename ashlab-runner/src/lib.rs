//! AshLab Runner: session orchestration on top of `ashlab-core`.
//!
//! This crate provides:
//! - TOML run configuration with validation and a deterministic run id
//! - Bar sources: CSV files, saved provider JSON, synthetic random walk
//! - Single-session and parallel multi-session runners
//! - PL and trade metrics
//! - JSON / CSV / Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{
    compute_dataset_hash, load_session, resolve_session_date, CsvBarSource, LoadError,
    LoadedSession, PriceHistoryFile, SyntheticSource,
};
pub use export::{load_artifacts, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{
    run_backtest_from_data, run_sessions, run_single_backtest, BacktestResult, RunError,
    SCHEMA_VERSION,
};
