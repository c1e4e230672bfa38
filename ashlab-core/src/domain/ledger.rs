use serde::{Deserialize, Serialize};

/// Session profit and loss.
///
/// `locked_pl` only moves when a flip realizes the closing leg.
/// `current_pl` is `locked_pl` plus the open position's unrealized PL at the
/// latest mark. `trade_count` counts flips, never the initial open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub locked_pl: f64,
    pub current_pl: f64,
    pub trade_count: u32,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }
}
