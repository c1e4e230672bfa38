//! Trade signal: the directional decision emitted per bar.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directional decision for one bar: short (-1), hold (0) or long (+1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Signal {
    /// Enter or flip to short
    Short,

    /// Leave the position unchanged
    Hold,

    /// Enter or flip to long
    Long,
}

impl Signal {
    pub fn as_i8(&self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Hold => 0,
            Signal::Long => 1,
        }
    }

    /// True for `Long` and `Short`.
    pub fn is_directional(&self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        signal.as_i8()
    }
}

/// Signal values outside {-1, 0, 1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("signal value {0} is not one of -1, 0, 1")]
pub struct SignalOutOfRange(pub i8);

impl TryFrom<i8> for Signal {
    type Error = SignalOutOfRange;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Short),
            0 => Ok(Signal::Hold),
            1 => Ok(Signal::Long),
            other => Err(SignalOutOfRange(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values() {
        assert_eq!(Signal::Short.as_i8(), -1);
        assert_eq!(Signal::Hold.as_i8(), 0);
        assert_eq!(Signal::Long.as_i8(), 1);
        assert_eq!(Signal::try_from(-1), Ok(Signal::Short));
        assert_eq!(Signal::try_from(2), Err(SignalOutOfRange(2)));
    }

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&Signal::Short).unwrap(), "-1");
        let parsed: Signal = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, Signal::Long);
        assert!(serde_json::from_str::<Signal>("5").is_err());
    }
}
