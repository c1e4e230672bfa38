//! Performance metrics: pure functions over the PL series and trade tape.
//!
//! PL here is absolute (price units times size), not a return on capital, so
//! drawdown is measured in the same units as the PL curve.

use ashlab_core::domain::TradeRecord;
use serde::{Deserialize, Serialize};

/// Aggregate statistics for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub final_pl: f64,
    pub peak_pl: f64,
    pub trough_pl: f64,
    /// Largest fall from a running peak of the PL curve, as a non-positive number.
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_trade_pl: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a PL curve and trade list.
    pub fn compute(pl_curve: &[f64], trades: &[TradeRecord]) -> Self {
        Self {
            final_pl: pl_curve.last().copied().unwrap_or(0.0),
            peak_pl: peak(pl_curve),
            trough_pl: trough(pl_curve),
            max_drawdown: max_drawdown(pl_curve),
            trade_count: trades.len(),
            winning_trades: trades.iter().filter(|t| t.is_winner()).count(),
            losing_trades: trades.iter().filter(|t| t.pnl < 0.0).count(),
            win_rate: win_rate(trades),
            avg_trade_pl: avg_trade_pl(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Highest point of the curve; 0.0 when empty.
pub fn peak(pl_curve: &[f64]) -> f64 {
    pl_curve.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Lowest point of the curve; 0.0 when empty.
pub fn trough(pl_curve: &[f64]) -> f64 {
    pl_curve.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Maximum drawdown in PL units (e.g. -1.5 = the curve fell 1.5 below a prior peak).
///
/// Returns 0.0 for an empty or non-decreasing curve.
pub fn max_drawdown(pl_curve: &[f64]) -> f64 {
    let Some(&first) = pl_curve.first() else {
        return 0.0;
    };
    let mut running_peak = first;
    let mut max_dd = 0.0_f64;
    for &pl in pl_curve {
        running_peak = running_peak.max(pl);
        max_dd = max_dd.min(pl - running_peak);
    }
    max_dd
}

/// Win rate: fraction of trades that were winners.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

pub fn avg_trade_pl(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.pnl).sum::<f64>() / trades.len() as f64
}
