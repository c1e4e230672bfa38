//! AshLab Core: domain types, Heikin-Ashi smoothing, signals, session gate,
//! position/PL ledger, backtest driver, live ingestion queue.
//!
//! This crate contains the heart of the intraday backtester:
//! - Domain types (bars, smoothed candles, position, ledger, PL series)
//! - Heikin-Ashi candle smoother
//! - Trend signal over smoothed candles
//! - Session window gate (trading hours and unit size)
//! - Single-position account with flip semantics
//! - Bar-by-bar session driver shared by backtest and live mode
//! - Drop-oldest queue and live consumer

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod live;
pub mod session;
pub mod signals;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core domain types are Send + Sync so sessions can
    /// run on rayon workers and inside tokio tasks.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::SmoothedCandle>();
        require_sync::<domain::SmoothedCandle>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Ledger>();
        require_sync::<domain::Ledger>();
        require_send::<domain::PlSeries>();
        require_sync::<domain::PlSeries>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();

        // Engine types
        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();
        require_send::<engine::RunResult>();
        require_sync::<engine::RunResult>();
        require_send::<engine::SessionState>();

        // Live types
        require_send::<live::LatestQueue<live::ChartMessage>>();
        require_sync::<live::LatestQueue<live::ChartMessage>>();
        require_send::<live::LiveConsumer>();
    }

    /// Architecture contract: a signal generator sees the candle and the
    /// position's direction, never prices, sizes or PL.
    #[test]
    fn signal_generator_sees_direction_only() {
        fn _check_trait_object_builds(
            sig: &dyn signals::SignalGenerator,
            candle: &domain::SmoothedCandle,
        ) -> signals::Signal {
            sig.evaluate(candle, domain::Direction::Flat)
        }
    }
}
