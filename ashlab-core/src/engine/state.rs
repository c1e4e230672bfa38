//! Engine configuration, per-session state, and run result types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Direction, Ledger, PlPoint, PlSeries, Position, TradeRecord};
use crate::engine::account::{Account, TradeOutcome};
use crate::engine::error::EngineError;
use crate::indicators::HeikinAshi;
use crate::session::SessionWindow;
use crate::signals::{HeikinAshiTrend, SignalGenerator};

/// Configuration for a single session run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub symbol: String,
    pub window: SessionWindow,
}

impl EngineConfig {
    pub fn new(symbol: impl Into<String>, window: SessionWindow) -> Self {
        Self {
            symbol: symbol.into(),
            window,
        }
    }
}

/// Mutable state that evolves bar-by-bar during one session.
///
/// Owns the smoother, the signal generator and the account. The backtest
/// driver and the live consumer both advance a session through
/// [`SessionState::step`], so the two modes share one pipeline.
pub struct SessionState<G = HeikinAshiTrend> {
    smoother: HeikinAshi,
    signal: G,
    account: Account,
    bar_index: usize,
    last_timestamp: Option<NaiveDateTime>,
    signal_count: usize,
}

impl SessionState<HeikinAshiTrend> {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_signal(config, HeikinAshiTrend::new())
    }
}

impl<G: SignalGenerator> SessionState<G> {
    pub fn with_signal(config: &EngineConfig, signal: G) -> Self {
        Self {
            smoother: HeikinAshi::new(),
            signal,
            account: Account::new(config.symbol.clone(), config.window),
            bar_index: 0,
            last_timestamp: None,
            signal_count: 0,
        }
    }

    /// Advance the session by one bar and return the PL recorded for it.
    ///
    /// The first bar only seeds the smoother and records the ledger's
    /// initial PL. Every later bar runs smooth -> signal -> gate -> trade.
    pub fn step(&mut self, bar: &Bar) -> Result<PlPoint, EngineError> {
        let index = self.bar_index;
        if let Some(previous) = self.last_timestamp {
            if bar.timestamp <= previous {
                return Err(EngineError::OutOfOrder {
                    index,
                    previous,
                    current: bar.timestamp,
                });
            }
        }

        let candle = self
            .smoother
            .update(bar)
            .map_err(|source| EngineError::InvalidBar { index, source })?;

        if let Some(candle) = candle {
            let signal = self.signal.evaluate(&candle, self.account.direction());
            if signal.is_directional() {
                self.signal_count += 1;
            }
            let size = self.account.window().allowed_size(bar.timestamp);
            if let TradeOutcome::Flipped { realized, .. } =
                self.account.apply_trade(signal, size, bar)
            {
                tracing::trace!(index, realized, "flip");
            }
        }

        self.bar_index += 1;
        self.last_timestamp = Some(bar.timestamp);
        Ok(PlPoint {
            timestamp: bar.timestamp,
            current_pl: self.account.ledger().current_pl,
        })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn direction(&self) -> Direction {
        self.account.direction()
    }

    pub fn bars_processed(&self) -> usize {
        self.bar_index
    }

    pub fn signal_count(&self) -> usize {
        self.signal_count
    }

    pub fn signal_name(&self) -> &str {
        self.signal.name()
    }

    /// Consume the session into a result around an already collected series.
    pub fn into_result(self, pl_series: PlSeries) -> RunResult {
        let signal_name = self.signal.name().to_string();
        let bar_count = self.bar_index;
        let signal_count = self.signal_count;
        let (position, ledger, trades) = self.account.into_parts();
        RunResult {
            pl_series,
            ledger,
            position,
            trades,
            signal_name,
            signal_count,
            bar_count,
        }
    }
}

/// Complete output of one session run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub pl_series: PlSeries,
    pub ledger: Ledger,
    /// Position left open when the bars ran out.
    pub position: Position,
    pub trades: Vec<TradeRecord>,
    pub signal_name: String,
    /// Directional signals emitted, whether or not the gate let them trade.
    pub signal_count: usize,
    pub bar_count: usize,
}

impl RunResult {
    pub fn final_pl(&self) -> f64 {
        self.ledger.current_pl
    }
}
