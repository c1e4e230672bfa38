//! Bar loading and session date resolution for the runner.
//!
//! Three [`BarSource`] implementations live here:
//! - [`CsvBarSource`]: a CSV file, or a directory of `<SYMBOL>.csv` files,
//!   with `timestamp,open,high,low,close,volume` rows on the exchange clock
//! - [`PriceHistoryFile`]: a saved provider response
//!   (`{"symbol": .., "candles": [{open, high, low, close, volume, datetime}]}`)
//!   with epoch-millisecond timestamps
//! - [`SyntheticSource`]: a seeded random walk for demos and tests
//!
//! Synthetic data is a developer-only mode. Results produced on it are tagged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ashlab_core::data::{BarSource, DataError, DataSource, RawCandle};
use ashlab_core::domain::Bar;
use ashlab_core::session::SessionWindow;
use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed price history in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} line {line}: unrecognised timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("no session date for '{symbol}': set backtest.date or pass --date")]
    NoSessionDate { symbol: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// One day of bars ready for the engine, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over every bar, for fingerprinting.
    pub dataset_hash: String,
    pub has_synthetic: bool,
    /// Bars that fall outside the session window. They are still replayed
    /// (they seed the smoother and mark PL) but never trade.
    pub outside_window: usize,
}

/// Fetch the bars for `symbol` on the window's date and tag them.
pub fn load_session(
    source: &dyn BarSource,
    symbol: &str,
    window: &SessionWindow,
) -> Result<LoadedSession, LoadError> {
    let date = window.date();
    let bars = source.fetch_daily_bars(symbol, date)?;
    if bars.is_empty() {
        return Err(DataError::NoBars {
            symbol: symbol.to_string(),
            date,
        }
        .into());
    }

    let outside_window = bars
        .iter()
        .filter(|b| !window.in_window(b.timestamp))
        .count();
    if outside_window > 0 {
        warn!(
            symbol,
            %date,
            outside_window,
            total = bars.len(),
            "bars outside the session window will not trade"
        );
    }

    let kind = source.kind();
    debug!(symbol, %date, source = source.name(), bars = bars.len(), "loaded session");
    Ok(LoadedSession {
        dataset_hash: compute_dataset_hash(symbol, &bars),
        has_synthetic: kind == DataSource::Synthetic,
        source: kind,
        bars,
        outside_window,
    })
}

/// Pick the session date: an explicit override, then the configured date,
/// then the first date the source holds for `symbol`.
pub fn resolve_session_date(
    source: &dyn BarSource,
    symbol: &str,
    override_date: Option<NaiveDate>,
    configured: Option<NaiveDate>,
) -> Result<NaiveDate, LoadError> {
    if let Some(date) = override_date.or(configured) {
        return Ok(date);
    }
    source
        .available_dates(symbol)?
        .into_iter()
        .next()
        .ok_or_else(|| LoadError::NoSessionDate {
            symbol: symbol.to_string(),
        })
}

/// Compute a deterministic BLAKE3 hash over one session of bars.
pub fn compute_dataset_hash(symbol: &str, bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for bar in bars {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

fn dates_of(bars: &[Bar]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = bars.iter().map(|b| b.timestamp.date()).collect();
    dates.dedup();
    dates
}

fn bars_on(bars: &[Bar], symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, DataError> {
    let day: Vec<Bar> = bars
        .iter()
        .filter(|b| b.timestamp.date() == date)
        .copied()
        .collect();
    if day.is_empty() {
        return Err(DataError::NoBars {
            symbol: symbol.to_string(),
            date,
        });
    }
    Ok(day)
}

// ─── CSV ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Minute bars from CSV.
///
/// A single file serves every symbol; a directory serves `<SYMBOL>.csv`.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    name: String,
    by_symbol: BTreeMap<String, Vec<Bar>>,
    any_symbol: Option<Vec<Bar>>,
}

impl CsvBarSource {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let name = format!("csv:{}", path.display());
        if path.is_dir() {
            let mut by_symbol = BTreeMap::new();
            let entries = std::fs::read_dir(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            for entry in entries {
                let file = entry
                    .map_err(|source| LoadError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?
                    .path();
                if file.extension().and_then(|e| e.to_str()) != Some("csv") {
                    continue;
                }
                let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                by_symbol.insert(stem.to_uppercase(), read_csv_bars(&file)?);
            }
            debug!(dir = %path.display(), symbols = by_symbol.len(), "indexed CSV directory");
            Ok(Self {
                name,
                by_symbol,
                any_symbol: None,
            })
        } else {
            Ok(Self {
                name,
                by_symbol: BTreeMap::new(),
                any_symbol: Some(read_csv_bars(path)?),
            })
        }
    }

    fn bars_for(&self, symbol: &str) -> Result<&[Bar], DataError> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .or(self.any_symbol.as_ref())
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}

fn read_csv_bars(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let mut record = csv::StringRecord::new();
    let mut bars = Vec::new();
    while reader.read_record(&mut record).map_err(csv_err)? {
        let row: CsvRow = record.deserialize(Some(&headers)).map_err(csv_err)?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            path: path.to_path_buf(),
            line: record.position().map_or(0, |p| p.line()),
            value: row.timestamp.clone(),
        })?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch_daily_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, DataError> {
        bars_on(self.bars_for(symbol)?, symbol, date)
    }

    fn available_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>, DataError> {
        Ok(dates_of(self.bars_for(symbol)?))
    }
}

// ─── Provider JSON ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PriceHistoryResponse {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    empty: bool,
    candles: Vec<RawCandle>,
}

/// A saved price-history response from a market-data provider.
#[derive(Debug, Clone)]
pub struct PriceHistoryFile {
    name: String,
    symbol: Option<String>,
    bars: Vec<Bar>,
}

impl PriceHistoryFile {
    /// Load and convert candles to the exchange clock at `offset`.
    pub fn open(path: &Path, offset: FixedOffset) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let response: PriceHistoryResponse =
            serde_json::from_str(&text).map_err(|source| LoadError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_response(format!("json:{}", path.display()), response, offset)
    }

    pub fn from_json(json: &str, offset: FixedOffset) -> Result<Self, LoadError> {
        let response: PriceHistoryResponse =
            serde_json::from_str(json).map_err(|source| LoadError::Json {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        Self::from_response("json:<inline>".into(), response, offset)
    }

    fn from_response(
        name: String,
        response: PriceHistoryResponse,
        offset: FixedOffset,
    ) -> Result<Self, LoadError> {
        if response.empty && !response.candles.is_empty() {
            warn!(%name, candles = response.candles.len(), "response flagged empty but has candles");
        }
        let mut bars = response
            .candles
            .iter()
            .map(|c| c.to_bar(offset))
            .collect::<Result<Vec<_>, _>>()?;
        bars.sort_by_key(|b| b.timestamp);
        Ok(Self {
            name,
            symbol: response.symbol,
            bars,
        })
    }

    fn check_symbol(&self, symbol: &str) -> Result<(), DataError> {
        match &self.symbol {
            Some(own) if !own.eq_ignore_ascii_case(symbol) => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl BarSource for PriceHistoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DataSource {
        DataSource::PriceHistoryJson
    }

    fn fetch_daily_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, DataError> {
        self.check_symbol(symbol)?;
        bars_on(&self.bars, symbol, date)
    }

    fn available_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>, DataError> {
        self.check_symbol(symbol)?;
        Ok(dates_of(&self.bars))
    }
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Deterministic random-walk minute bars.
///
/// The walk is seeded from the symbol and date, so the same request always
/// returns the same bars. Clearly fake and tagged as synthetic.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSource {
    pub first_bar: NaiveTime,
    pub bar_count: usize,
    pub start_price: f64,
}

impl Default for SyntheticSource {
    /// One regular session: 390 one-minute bars from 09:30.
    fn default() -> Self {
        Self {
            first_bar: NaiveTime::from_hms_opt(9, 30, 0).expect("09:30 is a valid time"),
            bar_count: 390,
            start_price: 100.0,
        }
    }
}

impl SyntheticSource {
    pub fn generate(&self, symbol: &str, date: NaiveDate) -> Vec<Bar> {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let seed_bytes = blake3::hash(format!("{symbol}@{date}").as_bytes());
        let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

        let start = date.and_time(self.first_bar);
        let mut price = self.start_price;
        (0..self.bar_count)
            .map(|i| {
                let minute_return: f64 = rng.gen_range(-0.002..0.002);
                let open = price;
                let close = price * (1.0 + minute_return);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.0005));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.0005));
                price = close;
                Bar {
                    timestamp: start + Duration::minutes(i as i64),
                    open,
                    high,
                    low,
                    close,
                    volume: rng.gen_range(1_000.0..50_000.0_f64).round(),
                }
            })
            .collect()
    }
}

impl BarSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn kind(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch_daily_bars(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Bar>, DataError> {
        Ok(self.generate(symbol, date))
    }
}
