use crate::domain::{Bar, Direction, Ledger, Position, TradeRecord};
use crate::session::SessionWindow;
use crate::signals::Signal;
use tracing::{debug, trace};

/// What a call to [`Account::apply_trade`] did to the position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeOutcome {
    /// Position untouched; PL re-marked only.
    Unchanged,
    /// First position of the session opened from flat.
    Opened { direction: Direction, price: f64 },
    /// Open position closed and replaced in the same bar.
    Flipped {
        direction: Direction,
        price: f64,
        realized: f64,
    },
}

/// Single-position account: the open position, the PL ledger and the
/// closed-leg tape for one session.
#[derive(Debug, Clone)]
pub struct Account {
    window: SessionWindow,
    position: Position,
    ledger: Ledger,
    trades: Vec<TradeRecord>,
}

impl Account {
    pub fn new(symbol: impl Into<String>, window: SessionWindow) -> Self {
        Self {
            window,
            position: Position::flat(symbol),
            ledger: Ledger::new(),
            trades: Vec::new(),
        }
    }

    /// Apply a signal at `bar.close`, then re-mark the current PL.
    ///
    /// A hold signal, a zero size or a bar outside the session window leaves
    /// the position alone. From flat, a directional signal opens a position.
    /// Otherwise it realizes the open leg at `bar.close`, counts one trade and
    /// opens the new leg at the same price; there is no flat bar in between.
    pub fn apply_trade(&mut self, signal: Signal, size: u32, bar: &Bar) -> TradeOutcome {
        let permitted =
            signal.is_directional() && size > 0 && self.window.in_window(bar.timestamp);

        let outcome = if !permitted {
            TradeOutcome::Unchanged
        } else if self.position.is_flat() {
            self.open(signal, size, bar);
            TradeOutcome::Opened {
                direction: self.position.direction,
                price: bar.close,
            }
        } else {
            let realized = self.close_leg(size, bar);
            self.open(signal, size, bar);
            TradeOutcome::Flipped {
                direction: self.position.direction,
                price: bar.close,
                realized,
            }
        };

        self.mark(bar.close);
        trace!(
            at = %bar.timestamp,
            locked = self.ledger.locked_pl,
            current = self.ledger.current_pl,
            "marked"
        );
        outcome
    }

    /// Recompute `current_pl` against `price`.
    pub fn mark(&mut self, price: f64) {
        self.ledger.current_pl = self.ledger.locked_pl + self.position.unrealized_pnl(price);
    }

    fn open(&mut self, signal: Signal, size: u32, bar: &Bar) {
        self.position.direction = Direction::from_signal(signal);
        self.position.entry_price = bar.close;
        self.position.size = size;
        self.position.opened_at = Some(bar.timestamp);
        debug!(
            symbol = %self.position.symbol,
            at = %bar.timestamp,
            direction = ?self.position.direction,
            price = bar.close,
            size,
            "opened position"
        );
    }

    /// Realize the open leg at `bar.close` using the size of the new trade.
    fn close_leg(&mut self, size: u32, bar: &Bar) -> f64 {
        let pnl = self
            .position
            .direction
            .pnl_per_unit(self.position.entry_price, bar.close)
            * f64::from(size);
        self.ledger.locked_pl += pnl;
        self.ledger.trade_count += 1;
        self.trades.push(TradeRecord {
            symbol: self.position.symbol.clone(),
            direction: self.position.direction,
            entry_time: self.position.opened_at,
            entry_price: self.position.entry_price,
            exit_time: bar.timestamp,
            exit_price: bar.close,
            size,
            pnl,
        });
        debug!(
            symbol = %self.position.symbol,
            at = %bar.timestamp,
            closed = ?self.position.direction,
            pnl,
            locked = self.ledger.locked_pl,
            trades = self.ledger.trade_count,
            "closed leg"
        );
        pnl
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn direction(&self) -> Direction {
        self.position.direction
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn window(&self) -> &SessionWindow {
        &self.window
    }

    pub(crate) fn into_parts(self) -> (Position, Ledger, Vec<TradeRecord>) {
        (self.position, self.ledger, self.trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 2, 22).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn bar_at(ts: NaiveDateTime, close: f64) -> Bar {
        Bar::new(ts, close, close + 0.5, close - 0.5, close)
    }

    fn account() -> Account {
        Account::new("AAPL", SessionWindow::regular(day()))
    }

    #[test]
    fn first_signal_opens_without_realizing() {
        let mut acc = account();
        let outcome = acc.apply_trade(Signal::Long, 1, &bar_at(at(9, 31), 11.8));

        assert_eq!(
            outcome,
            TradeOutcome::Opened {
                direction: Direction::Long,
                price: 11.8
            }
        );
        assert!(acc.position().is_long());
        assert_eq!(acc.position().entry_price, 11.8);
        assert_eq!(acc.ledger().locked_pl, 0.0);
        assert_eq!(acc.ledger().current_pl, 0.0);
        assert_eq!(acc.ledger().trade_count, 0);
        assert!(acc.trades().is_empty());
    }

    #[test]
    fn flip_long_to_short_realizes_long_leg() {
        let mut acc = account();
        acc.apply_trade(Signal::Long, 1, &bar_at(at(9, 31), 11.8));
        let outcome = acc.apply_trade(Signal::Short, 1, &bar_at(at(9, 32), 9.5));

        match outcome {
            TradeOutcome::Flipped {
                direction,
                price,
                realized,
            } => {
                assert_eq!(direction, Direction::Short);
                assert_eq!(price, 9.5);
                assert!((realized - -2.3).abs() < 1e-9);
            }
            other => panic!("expected flip, got {other:?}"),
        }
        assert!(acc.position().is_short());
        assert_eq!(acc.position().entry_price, 9.5);
        assert!((acc.ledger().locked_pl - -2.3).abs() < 1e-9);
        assert!((acc.ledger().current_pl - -2.3).abs() < 1e-9);
        assert_eq!(acc.ledger().trade_count, 1);
        assert_eq!(acc.trades().len(), 1);
        assert_eq!(acc.trades()[0].direction, Direction::Long);
        assert_eq!(acc.trades()[0].entry_time, Some(at(9, 31)));
    }

    #[test]
    fn flip_short_to_long_realizes_short_leg() {
        let mut acc = account();
        acc.apply_trade(Signal::Short, 1, &bar_at(at(9, 31), 20.0));
        acc.apply_trade(Signal::Long, 1, &bar_at(at(9, 32), 18.0));
        assert_eq!(acc.ledger().locked_pl, 2.0);
        assert!(acc.position().is_long());
    }

    #[test]
    fn hold_only_remarks() {
        let mut acc = account();
        acc.apply_trade(Signal::Long, 1, &bar_at(at(9, 31), 10.0));
        let before = acc.position().clone();

        let outcome = acc.apply_trade(Signal::Hold, 1, &bar_at(at(9, 32), 12.5));
        assert_eq!(outcome, TradeOutcome::Unchanged);
        assert_eq!(acc.position(), &before);
        assert_eq!(acc.ledger().locked_pl, 0.0);
        assert_eq!(acc.ledger().current_pl, 2.5);
    }

    #[test]
    fn zero_size_blocks_trade() {
        let mut acc = account();
        let outcome = acc.apply_trade(Signal::Long, 0, &bar_at(at(9, 31), 10.0));
        assert_eq!(outcome, TradeOutcome::Unchanged);
        assert!(acc.position().is_flat());
        assert_eq!(acc.ledger().current_pl, 0.0);
    }

    #[test]
    fn outside_window_blocks_trade_but_still_marks() {
        let mut acc = account();
        acc.apply_trade(Signal::Short, 1, &bar_at(at(15, 58), 50.0));

        let outcome = acc.apply_trade(Signal::Long, 1, &bar_at(at(16, 0), 49.0));
        assert_eq!(outcome, TradeOutcome::Unchanged);
        assert!(acc.position().is_short());
        assert_eq!(acc.ledger().trade_count, 0);
        assert_eq!(acc.ledger().current_pl, 1.0);
    }

    #[test]
    fn flat_account_marks_to_zero() {
        let mut acc = account();
        acc.apply_trade(Signal::Hold, 1, &bar_at(at(9, 45), 123.0));
        assert_eq!(acc.ledger().current_pl, 0.0);
    }

    #[test]
    fn trade_tape_sums_to_locked_pl() {
        let mut acc = account();
        let closes = [10.0, 11.0, 10.5, 12.0, 11.25];
        let signals = [
            Signal::Long,
            Signal::Short,
            Signal::Long,
            Signal::Short,
            Signal::Long,
        ];
        for (i, (&close, &signal)) in closes.iter().zip(signals.iter()).enumerate() {
            acc.apply_trade(signal, 1, &bar_at(at(10, i as u32), close));
        }
        let tape: f64 = acc.trades().iter().map(|t| t.pnl).sum();
        assert_eq!(acc.ledger().trade_count, 4);
        assert!((tape - acc.ledger().locked_pl).abs() < 1e-9);
    }
}
