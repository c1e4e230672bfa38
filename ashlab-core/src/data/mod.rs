//! Bar sources consumed by the engine.

pub mod provider;

pub use provider::{epoch_millis_to_local, BarSource, DataError, DataSource, RawCandle};
