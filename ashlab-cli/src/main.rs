//! AshLab CLI: backtest and live commands.
//!
//! Commands:
//! - `run`: replay one or more sessions from a bar file (or synthetic bars)
//!   and save result.json, pl_series.csv, trades.csv and report.md
//! - `live`: read newline-delimited chart messages from stdin through a
//!   drop-oldest queue and print the PL of every processed bar

mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ashlab_core::data::BarSource;
use ashlab_core::domain::PlPoint;
use ashlab_core::live::{ChartMessage, LatestQueue, LiveConsumer};
use ashlab_runner::{
    run_sessions, run_single_backtest, save_artifacts, BacktestConfig, BacktestResult,
    CsvBarSource, PriceHistoryFile, SyntheticSource,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ashlab", about = "AshLab: Heikin-Ashi intraday backtester")]
struct Cli {
    /// Also write JSON logs to a daily-rolling file in this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay sessions from a bar file and save artifacts.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Bars: a CSV file, a directory of <SYMBOL>.csv files, or a saved
        /// price-history JSON file.
        #[arg(long)]
        bars: Option<PathBuf>,

        /// Use synthetic bars instead of a file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Session date (YYYY-MM-DD). Repeat to run several sessions in parallel.
        #[arg(long = "date")]
        dates: Vec<NaiveDate>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Stream chart messages (one JSON object per line) from stdin.
    Live {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Session date (YYYY-MM-DD). Defaults to the config, then the first message.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_tracing(cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Run {
            config,
            bars,
            synthetic,
            dates,
            output_dir,
        } => run_backtest_cmd(&config, bars.as_deref(), synthetic, &dates, &output_dir),
        Commands::Live { config, date } => {
            let config = BacktestConfig::from_file(&config)
                .with_context(|| format!("failed to load {}", config.display()))?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let outcome = runtime.block_on(run_live_cmd(config, date));
            // stdin reads run on a blocking thread that may still be parked.
            runtime.shutdown_background();
            outcome
        }
    }
}

// ─── run ────────────────────────────────────────────────────────────

fn run_backtest_cmd(
    config_path: &Path,
    bars: Option<&Path>,
    synthetic: bool,
    dates: &[NaiveDate],
    output_dir: &Path,
) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let source = open_source(&config, bars, synthetic)?;

    if dates.len() > 1 {
        let results = run_sessions(&config, source.as_ref(), dates)?;
        let mut failed = 0;
        for (date, result) in dates.iter().zip(results) {
            match result {
                Ok(result) => {
                    print_summary(&result);
                    let run_dir = save_artifacts(&result, output_dir)?;
                    println!("Artifacts saved to: {}\n", run_dir.display());
                }
                Err(e) => {
                    failed += 1;
                    eprintln!("{date}: {e}");
                }
            }
        }
        if failed > 0 {
            bail!("{failed} of {} sessions failed", dates.len());
        }
        return Ok(());
    }

    let result = run_single_backtest(&config, source.as_ref(), dates.first().copied())?;
    print_summary(&result);
    let run_dir = save_artifacts(&result, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn open_source(
    config: &BacktestConfig,
    bars: Option<&Path>,
    synthetic: bool,
) -> Result<Box<dyn BarSource>> {
    match (bars, synthetic) {
        (Some(_), true) => bail!("--bars and --synthetic are mutually exclusive"),
        (None, false) => bail!("one of --bars or --synthetic is required"),
        (None, true) => {
            warn!("using synthetic bars; results will be tagged as synthetic");
            Ok(Box::new(SyntheticSource::default()))
        }
        (Some(path), false) => {
            let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
            if is_json {
                let offset = config
                    .utc_offset()
                    .context("session.utc_offset_minutes is out of range")?;
                Ok(Box::new(PriceHistoryFile::open(path, offset)?))
            } else {
                Ok(Box::new(CsvBarSource::open(path)?))
            }
        }
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!("=== {} {} ===", result.symbol, result.date);
    if result.has_synthetic {
        println!("  ** SYNTHETIC DATA **");
    }
    println!(
        "  Bars:         {} ({} outside window)",
        result.bar_count, result.outside_window_bars
    );
    println!("  Signals:      {}", result.signal_count);
    println!("  Trades:       {}", m.trade_count);
    println!("  Locked PL:    {:.4}", result.ledger.locked_pl);
    println!("  Final PL:     {:.4}", m.final_pl);
    println!("  Peak PL:      {:.4}", m.peak_pl);
    println!("  Max Drawdown: {:.4}", m.max_drawdown);
    println!("  Win Rate:     {:.1}%", m.win_rate * 100.0);
    println!(
        "  Position:     {:?} x{} @ {:.4}",
        result.final_position.direction,
        result.final_position.size,
        result.final_position.entry_price
    );
}

// ─── live ───────────────────────────────────────────────────────────

async fn run_live_cmd(config: BacktestConfig, date: Option<NaiveDate>) -> Result<()> {
    let offset = config
        .utc_offset()
        .context("session.utc_offset_minutes is out of range")?;
    let queue = Arc::new(LatestQueue::new(config.live.queue_size));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // The session date may come from the first message, so read it before
    // building the consumer.
    let Some(first) = next_message(&mut lines).await? else {
        bail!("no chart messages on stdin");
    };
    let date = match date.or(config.backtest.date) {
        Some(date) => date,
        None => first.to_bar(offset)?.timestamp.date(),
    };
    queue.enqueue(first);

    let engine_config = config.engine_config(date);
    let mut consumer = LiveConsumer::new(&engine_config, Arc::clone(&queue), offset);
    info!(
        symbol = config.symbol(),
        %date,
        queue_size = queue.capacity(),
        "live session started"
    );

    let mut producer = tokio::spawn(produce(lines, Arc::clone(&queue)));
    let received = drive(&mut consumer, &mut producer, print_point).await?;
    info!(received = received + 1, "stdin closed");

    let ledger = consumer.state().account().ledger();
    info!(
        locked_pl = ledger.locked_pl,
        current_pl = ledger.current_pl,
        trades = ledger.trade_count,
        dropped = queue.evicted(),
        "live session ended"
    );
    Ok(())
}

/// Step the consumer until the producer finishes, then drain what it left
/// queued. Returns the producer's message count.
///
/// The consumer only returns on error. In that case the producer is aborted,
/// since it may be parked on a read that never completes.
async fn drive<F>(
    consumer: &mut LiveConsumer,
    producer: &mut JoinHandle<Result<u64>>,
    mut on_point: F,
) -> Result<u64>
where
    F: FnMut(&PlPoint),
{
    let outcome = tokio::select! {
        res = consumer.run(&mut on_point) => Err(res),
        res = &mut *producer => Ok(res),
    };
    let received = match outcome {
        Ok(joined) => joined??,
        Err(res) => {
            producer.abort();
            res?;
            bail!("live consumer stopped");
        }
    };

    while !consumer.queue().is_empty() {
        let point = consumer.next_point().await?;
        on_point(&point);
    }
    Ok(received)
}

/// Read messages until EOF, enqueueing each. Returns how many were enqueued.
async fn produce(
    mut lines: Lines<BufReader<Stdin>>,
    queue: Arc<LatestQueue<ChartMessage>>,
) -> Result<u64> {
    let mut received = 0;
    while let Some(msg) = next_message(&mut lines).await? {
        queue.enqueue(msg);
        received += 1;
    }
    Ok(received)
}

/// Next decodable message. Blank lines are skipped; lines that are not chart
/// JSON are logged and skipped. Missing prices still decode and are rejected
/// by the session.
async fn next_message(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<ChartMessage>> {
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match ChartMessage::from_json(line) {
            Ok(msg) => return Ok(Some(msg)),
            Err(e) => warn!(error = %e, "skipping malformed chart message"),
        }
    }
    Ok(None)
}

fn print_point(point: &PlPoint) {
    println!("{}  {:>12.4}", point.timestamp, point.current_pl);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ashlab_core::engine::EngineConfig;
    use ashlab_core::session::SessionWindow;
    use chrono::FixedOffset;

    /// 2021-02-22 09:31 EST in epoch milliseconds.
    const FIRST_BAR_MS: i64 = 1_614_004_260_000;

    fn consumer(queue: &Arc<LatestQueue<ChartMessage>>) -> LiveConsumer {
        let day = NaiveDate::from_ymd_opt(2021, 2, 22).unwrap();
        let config = EngineConfig::new("AAPL", SessionWindow::regular(day));
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
        LiveConsumer::new(&config, Arc::clone(queue), eastern)
    }

    fn message(minute: i64, close: f64) -> ChartMessage {
        ChartMessage {
            key: Some("AAPL".into()),
            open_price: 10.0,
            high_price: 12.0,
            low_price: 9.0,
            close_price: close,
            volume: 100.0,
            chart_time: FIRST_BAR_MS + minute * 60_000,
        }
    }

    #[tokio::test]
    async fn consumer_error_aborts_stalled_producer() {
        let queue = Arc::new(LatestQueue::new(1));
        let mut consumer = consumer(&queue);
        queue.enqueue(message(0, f64::NAN));

        // Stands in for a stdin read that never returns.
        let mut producer = tokio::spawn(std::future::pending::<Result<u64>>());
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            drive(&mut consumer, &mut producer, |_| {}),
        )
        .await
        .expect("drive should return once the consumer fails");

        assert!(outcome.is_err());
        assert!(producer.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn queued_messages_are_drained_after_producer_finishes() {
        let queue = Arc::new(LatestQueue::new(4));
        let mut consumer = consumer(&queue);
        for (minute, close) in [(0, 10.5), (1, 11.8), (2, 9.5)] {
            queue.enqueue(message(minute, close));
        }

        let mut producer = tokio::spawn(async { Ok(3) });
        let mut points = Vec::new();
        let received = drive(&mut consumer, &mut producer, |p| points.push(*p))
            .await
            .unwrap();

        assert_eq!(received, 3);
        assert_eq!(points.len(), 3);
        assert!(queue.is_empty());
        assert_eq!(consumer.state().bars_processed(), 3);
    }
}
