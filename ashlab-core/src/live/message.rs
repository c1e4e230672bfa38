//! Chart message: the minute-bar payload a stream producer hands over.

use chrono::FixedOffset;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::data::epoch_millis_to_local;
use crate::domain::Bar;

/// One streamed minute bar for an equity chart subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ChartMessage {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default = "missing_price", deserialize_with = "price")]
    pub open_price: f64,
    #[serde(default = "missing_price", deserialize_with = "price")]
    pub high_price: f64,
    #[serde(default = "missing_price", deserialize_with = "price")]
    pub low_price: f64,
    #[serde(default = "missing_price", deserialize_with = "price")]
    pub close_price: f64,
    #[serde(default)]
    pub volume: f64,
    /// Bar start, milliseconds since the Unix epoch.
    pub chart_time: i64,
}

// A missing or null price decodes as NaN so bar validation rejects it.
fn missing_price() -> f64 {
    f64::NAN
}

fn price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Payloads the live consumer cannot turn into a bar.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed chart message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chart time {0} ms is out of range")]
    TimestampOutOfRange(i64),
}

impl ChartMessage {
    pub fn from_json(line: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Convert to a [`Bar`] on the exchange-local clock given by `offset`.
    pub fn to_bar(&self, offset: FixedOffset) -> Result<Bar, DecodeError> {
        let timestamp = epoch_millis_to_local(self.chart_time, offset)
            .ok_or(DecodeError::TimestampOutOfRange(self.chart_time))?;
        Ok(Bar {
            timestamp,
            open: self.open_price,
            high: self.high_price,
            low: self.low_price,
            close: self.close_price,
            volume: self.volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_stream_payload() {
        let line = r#"{"KEY":"AAPL","OPEN_PRICE":10.0,"HIGH_PRICE":11.0,"LOW_PRICE":9.0,"CLOSE_PRICE":10.5,"VOLUME":300,"CHART_TIME":1614004260000}"#;
        let msg = ChartMessage::from_json(line).unwrap();
        assert_eq!(msg.key.as_deref(), Some("AAPL"));

        let bar = msg.to_bar(FixedOffset::west_opt(5 * 3600).unwrap()).unwrap();
        let expected = NaiveDate::from_ymd_opt(2021, 2, 22)
            .unwrap()
            .and_hms_opt(9, 31, 0)
            .unwrap();
        assert_eq!(bar.timestamp, expected);
        assert_eq!(bar.open, 10.0);
        assert_eq!(bar.close, 10.5);
    }

    #[test]
    fn missing_or_null_price_decodes_as_nan() {
        let missing = r#"{"OPEN_PRICE":10.0,"HIGH_PRICE":11.0,"LOW_PRICE":9.0,"CHART_TIME":1}"#;
        let msg = ChartMessage::from_json(missing).unwrap();
        assert!(msg.close_price.is_nan());
        assert_eq!(msg.open_price, 10.0);

        let null = r#"{"OPEN_PRICE":null,"HIGH_PRICE":11.0,"LOW_PRICE":9.0,"CLOSE_PRICE":10.5,"CHART_TIME":1}"#;
        assert!(ChartMessage::from_json(null).unwrap().open_price.is_nan());
    }

    #[test]
    fn missing_chart_time_is_a_decode_error() {
        let line = r#"{"OPEN_PRICE":10.0,"HIGH_PRICE":11.0,"LOW_PRICE":9.0,"CLOSE_PRICE":10.5}"#;
        assert!(matches!(
            ChartMessage::from_json(line),
            Err(DecodeError::Json(_))
        ));
    }
}
