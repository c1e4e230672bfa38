//! Domain types for AshLab

pub mod bar;
pub mod candle;
pub mod ledger;
pub mod position;
pub mod series;
pub mod trade;

pub use bar::{Bar, InvalidBar};
pub use candle::SmoothedCandle;
pub use ledger::Ledger;
pub use position::{Direction, Position};
pub use series::{PlPoint, PlSeries};
pub use trade::TradeRecord;
