//! Criterion benchmarks for AshLab hot paths.
//!
//! Benchmarks:
//! 1. Full session run (smooth + signal + gate + ledger per bar)
//! 2. Heikin-Ashi smoothing alone
//! 3. Live queue enqueue under constant overflow

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ashlab_core::domain::Bar;
use ashlab_core::engine::{run_backtest, EngineConfig};
use ashlab_core::indicators::smooth_series;
use ashlab_core::live::LatestQueue;
use ashlab_core::session::SessionWindow;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let start = chrono::NaiveDate::from_ymd_opt(2021, 2, 22)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar::new(
                start + chrono::Duration::minutes(i as i64),
                open,
                close + 1.5,
                close - 1.5,
                close,
            )
        })
        .collect()
}

fn config() -> EngineConfig {
    let date = chrono::NaiveDate::from_ymd_opt(2021, 2, 22).unwrap();
    EngineConfig::new("BENCH", SessionWindow::regular(date))
}

// ── 1. Session run ───────────────────────────────────────────────────

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_run");
    let cfg = config();

    // A regular session is 390 minutes; the longer runs extend past the close.
    for &bar_count in &[390, 960, 1440] {
        let bars = make_bars(bar_count);
        group.bench_with_input(BenchmarkId::from_parameter(bar_count), &bars, |b, bars| {
            b.iter(|| run_backtest(black_box(bars), &cfg))
        });
    }
    group.finish();
}

// ── 2. Smoothing ─────────────────────────────────────────────────────

fn bench_smoothing(c: &mut Criterion) {
    let bars = make_bars(1440);
    c.bench_function("heikin_ashi_1440", |b| {
        b.iter(|| smooth_series(black_box(&bars)))
    });
}

// ── 3. Queue ─────────────────────────────────────────────────────────

fn bench_queue_overflow(c: &mut Criterion) {
    let queue = LatestQueue::new(1);
    c.bench_function("latest_queue_enqueue_overflow", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            black_box(queue.enqueue(i))
        })
    });
}

criterion_group!(benches, bench_session, bench_smoothing, bench_queue_overflow);
criterion_main!(benches);
