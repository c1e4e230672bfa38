//! Market window gate: which bars may trade, and how many units.

pub mod window;

pub use window::{SessionHours, SessionWindow};
