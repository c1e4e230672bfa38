use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::signals::Signal;

/// Side of the single session position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Flat,
    Long,
    Short,
}

impl Direction {
    /// Direction a non-zero signal opens. `Hold` maps to `Flat`.
    pub fn from_signal(signal: Signal) -> Self {
        match signal {
            Signal::Long => Direction::Long,
            Signal::Short => Direction::Short,
            Signal::Hold => Direction::Flat,
        }
    }

    /// PL per unit of a move from `entry` to `mark` for this side.
    pub fn pnl_per_unit(&self, entry: f64, mark: f64) -> f64 {
        match self {
            Direction::Long => mark - entry,
            Direction::Short => entry - mark,
            Direction::Flat => 0.0,
        }
    }
}

/// The one open position of a session.
///
/// Starts `Flat` and is replaced in place on every permitted non-zero signal.
/// It is never removed; a new session starts from [`Position::flat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub size: u32,
    pub opened_at: Option<NaiveDateTime>,
}

impl Position {
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            direction: Direction::Flat,
            entry_price: 0.0,
            size: 0,
            opened_at: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.direction == Direction::Flat
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }

    /// Unrealized PL of this position marked at `price`. Zero when flat.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.direction.pnl_per_unit(self.entry_price, price) * f64::from(self.size)
    }
}
