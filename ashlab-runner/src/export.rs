//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: PL series and closed-trade tape for external analysis tools
//! - **Markdown**: a human-readable single-session report
//!
//! All persisted artifacts include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ashlab_core::domain::{PlSeries, TradeRecord};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the PL series as `timestamp,current_pl`.
pub fn export_pl_csv(series: &PlSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "current_pl"])?;
    for point in series {
        wtr.write_record([
            point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.6}", point.current_pl),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the closed-trade tape.
///
/// Columns: symbol, direction, entry_time, entry_price, exit_time,
/// exit_price, size, pnl, minutes_held
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "direction",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "size",
        "pnl",
        "minutes_held",
    ])?;

    for t in trades {
        wtr.write_record([
            t.symbol.clone(),
            format!("{:?}", t.direction),
            t.entry_time
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            format!("{:.6}", t.entry_price),
            t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.6}", t.exit_price),
            t.size.to_string(),
            format!("{:.6}", t.pnl),
            t.minutes_held().map(|m| m.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one session.
///
/// Creates `{symbol}_{date}/` under `output_dir` containing:
/// - `result.json`: the full `BacktestResult`
/// - `pl_series.csv`: one PL point per bar
/// - `trades.csv`: closed legs
/// - `report.md`: Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, result.date));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("pl_series.csv"), export_pl_csv(&result.pl_series)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&result.trades)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(result))?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for one session.
pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# Session Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!("| Date | {} |\n", result.date));
    md.push_str(&format!(
        "| Window | {} to {} |\n",
        result.window.opens_at().format("%H:%M"),
        result.window.closes_at().format("%H:%M")
    ));
    md.push_str(&format!("| Unit Size | {} |\n", result.window.unit_size()));
    md.push_str(&format!(
        "| Bars | {} ({} outside window) |\n",
        result.bar_count, result.outside_window_bars
    ));
    md.push_str(&format!(
        "| Signals | {} ({}) |\n",
        result.signal_count, result.signal_name
    ));
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let m = &result.metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Final PL | {:.4} |\n", m.final_pl));
    md.push_str(&format!("| Locked PL | {:.4} |\n", result.ledger.locked_pl));
    md.push_str(&format!("| Peak PL | {:.4} |\n", m.peak_pl));
    md.push_str(&format!("| Trough PL | {:.4} |\n", m.trough_pl));
    md.push_str(&format!("| Max Drawdown | {:.4} |\n", m.max_drawdown));
    md.push_str(&format!("| Trades | {} |\n", m.trade_count));
    md.push_str(&format!(
        "| Win Rate | {:.1}% ({}W / {}L) |\n",
        m.win_rate * 100.0,
        m.winning_trades,
        m.losing_trades
    ));
    md.push_str(&format!("| Avg Trade PL | {:.4} |\n", m.avg_trade_pl));
    md.push_str(&format!(
        "| Open Position | {:?} x{} @ {:.4} |\n",
        result.final_position.direction,
        result.final_position.size,
        result.final_position.entry_price
    ));
    md.push('\n');

    md
}
