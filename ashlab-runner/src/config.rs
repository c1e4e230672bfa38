//! TOML run configuration.
//!
//! ```toml
//! [backtest]
//! symbol = "AAPL"
//! date = "2021-02-22"
//!
//! [session]
//! open = "09:30"
//! close = "16:00"
//! unit_size = 1
//! utc_offset_minutes = -300
//!
//! [live]
//! queue_size = 1
//! ```
//!
//! Only `[backtest].symbol` is required; every other key has a default.

use std::path::Path;

use ashlab_core::engine::EngineConfig;
use ashlab_core::live::LatestQueue;
use ashlab_core::session::SessionHours;
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a run (content-addressable hash of the config).
pub type RunId = String;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full configuration for a backtest or live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub live: LiveSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    /// Session date. When absent the first date the bar source holds is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(with = "hhmm", default = "default_open")]
    pub open: NaiveTime,
    #[serde(with = "hhmm", default = "default_close")]
    pub close: NaiveTime,
    #[serde(default = "default_unit_size")]
    pub unit_size: u32,
    /// Exchange clock relative to UTC, used to convert epoch timestamps.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveSection {
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

fn default_open() -> NaiveTime {
    SessionHours::default().open
}

fn default_close() -> NaiveTime {
    SessionHours::default().close
}

fn default_unit_size() -> u32 {
    SessionHours::default().unit_size
}

/// US Eastern standard time.
fn default_utc_offset_minutes() -> i32 {
    -300
}

fn default_queue_size() -> usize {
    LatestQueue::<()>::DEFAULT_CAPACITY
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            open: default_open(),
            close: default_close(),
            unit_size: default_unit_size(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl Default for LiveSection {
    fn default() -> Self {
        Self {
            queue_size: default_queue_size(),
        }
    }
}

impl BacktestConfig {
    /// Config for `symbol` with every other key at its default.
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            backtest: BacktestSection {
                symbol: symbol.into(),
                date: None,
            },
            session: SessionSection::default(),
            live: LiveSection::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("backtest.symbol is empty".into()));
        }
        if self.session.open >= self.session.close {
            return Err(ConfigError::Invalid(format!(
                "session.open ({}) must be before session.close ({})",
                self.session.open.format("%H:%M"),
                self.session.close.format("%H:%M"),
            )));
        }
        if self.session.unit_size == 0 {
            return Err(ConfigError::Invalid("session.unit_size must be at least 1".into()));
        }
        if self.live.queue_size == 0 {
            return Err(ConfigError::Invalid("live.queue_size must be at least 1".into()));
        }
        if self.utc_offset().is_none() {
            return Err(ConfigError::Invalid(format!(
                "session.utc_offset_minutes ({}) is outside +/- 24h",
                self.session.utc_offset_minutes
            )));
        }
        Ok(())
    }

    /// Deterministic hash of the serialized config.
    ///
    /// Two runs with identical configs share a `RunId`.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("BacktestConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn symbol(&self) -> &str {
        &self.backtest.symbol
    }

    pub fn session_hours(&self) -> SessionHours {
        SessionHours {
            open: self.session.open,
            close: self.session.close,
            unit_size: self.session.unit_size,
        }
    }

    /// Exchange clock offset; `None` when the configured minutes are out of range.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.session.utc_offset_minutes.checked_mul(60)?)
    }

    /// Engine config for one session on `date`.
    pub fn engine_config(&self, date: NaiveDate) -> EngineConfig {
        EngineConfig::new(
            self.backtest.symbol.clone(),
            self.session_hours().for_date(date),
        )
    }
}

/// `NaiveTime` as `"HH:MM"`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[backtest]
symbol = "AAPL"
date = "2021-02-22"

[session]
open = "09:45"
close = "15:30"
unit_size = 2
utc_offset_minutes = -300

[live]
queue_size = 4
"#;

    #[test]
    fn parses_full_config() {
        let config = BacktestConfig::from_toml(FULL).unwrap();
        assert_eq!(config.symbol(), "AAPL");
        assert_eq!(
            config.backtest.date,
            Some(NaiveDate::from_ymd_opt(2021, 2, 22).unwrap())
        );
        assert_eq!(config.session.open, NaiveTime::from_hms_opt(9, 45, 0).unwrap());
        assert_eq!(config.session.close, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
        assert_eq!(config.session.unit_size, 2);
        assert_eq!(config.live.queue_size, 4);
        assert_eq!(
            config.utc_offset(),
            FixedOffset::west_opt(5 * 3600)
        );
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = BacktestConfig::from_toml("[backtest]\nsymbol = \"MSFT\"\n").unwrap();
        assert_eq!(config.backtest.date, None);
        assert_eq!(config.session_hours(), SessionHours::default());
        assert_eq!(config.session.utc_offset_minutes, -300);
        assert_eq!(config.live.queue_size, 1);
        assert_eq!(config, BacktestConfig::for_symbol("MSFT"));
    }

    #[test]
    fn engine_config_uses_session_hours() {
        let config = BacktestConfig::from_toml(FULL).unwrap();
        let date = NaiveDate::from_ymd_opt(2021, 2, 22).unwrap();
        let engine = config.engine_config(date);
        assert_eq!(engine.symbol, "AAPL");
        assert_eq!(
            engine.window.opens_at(),
            date.and_hms_opt(9, 45, 0).unwrap()
        );
        assert_eq!(engine.window.unit_size(), 2);
    }

    #[test]
    fn rejects_inverted_hours() {
        let toml = "[backtest]\nsymbol = \"AAPL\"\n[session]\nopen = \"16:00\"\nclose = \"09:30\"\n";
        assert!(matches!(
            BacktestConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_zero_unit_size_and_queue() {
        let zero_unit = "[backtest]\nsymbol = \"AAPL\"\n[session]\nunit_size = 0\n";
        assert!(matches!(
            BacktestConfig::from_toml(zero_unit),
            Err(ConfigError::Invalid(_))
        ));
        let zero_queue = "[backtest]\nsymbol = \"AAPL\"\n[live]\nqueue_size = 0\n";
        assert!(matches!(
            BacktestConfig::from_toml(zero_queue),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_malformed_time() {
        let toml = "[backtest]\nsymbol = \"AAPL\"\n[session]\nopen = \"9h30\"\n";
        assert!(matches!(
            BacktestConfig::from_toml(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let a = BacktestConfig::from_toml(FULL).unwrap();
        let b = BacktestConfig::from_toml(FULL).unwrap();
        assert_eq!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 64);

        let mut c = a.clone();
        c.session.unit_size = 3;
        assert_ne!(a.run_id(), c.run_id());
    }

    #[test]
    fn serializes_back_to_hhmm() {
        let config = BacktestConfig::from_toml(FULL).unwrap();
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("open = \"09:45\""));
        assert_eq!(BacktestConfig::from_toml(&text).unwrap(), config);
    }
}
