use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::InvalidBar;

/// Errors that abort a session. No partial PL series survives an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("backtest needs at least one bar")]
    EmptyInput,

    #[error("bar {index}: {source}")]
    InvalidBar {
        index: usize,
        #[source]
        source: InvalidBar,
    },

    #[error("bar {index} at {current} does not follow previous bar at {previous}")]
    OutOfOrder {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
}
