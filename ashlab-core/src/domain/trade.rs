//! TradeRecord: one closed leg of the session position.

use super::position::Direction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A closed leg: the position that was open until a flip replaced it.
///
/// Exactly one record is produced per flip, so the number of records equals
/// the ledger's trade count and their PL sums to the locked PL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub symbol: String,
    pub direction: Direction,

    // ── Entry ──
    pub entry_time: Option<NaiveDateTime>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,

    // ── Size ──
    pub size: u32,

    // ── PnL ──
    pub pnl: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    /// Minutes the leg was held, when the entry time is known.
    pub fn minutes_held(&self) -> Option<i64> {
        self.entry_time
            .map(|entry| (self.exit_time - entry).num_minutes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn minutes_held_from_entry_to_exit() {
        let day = NaiveDate::from_ymd_opt(2021, 2, 22).unwrap();
        let trade = TradeRecord {
            symbol: "AAPL".into(),
            direction: Direction::Long,
            entry_time: day.and_hms_opt(9, 31, 0),
            entry_price: 11.8,
            exit_time: day.and_hms_opt(9, 45, 0).unwrap(),
            exit_price: 9.5,
            size: 1,
            pnl: 9.5 - 11.8,
        };
        assert_eq!(trade.minutes_held(), Some(14));
        assert!(!trade.is_winner());
    }
}
