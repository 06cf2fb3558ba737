//! Criterion benchmarks for the per-symbol analysis hot paths.
//!
//! Benchmarks:
//! 1. Indicator batch compute (the full screening stack per symbol)
//! 2. Trend template evaluation against a benchmark series
//! 3. Extrema detection and contraction analysis
//! 4. Signal advisor (indicators plus the four-rule vote)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vcplab_core::domain::{Bar, PriceSeries};
use vcplab_core::indicators::{
    Atr, AvgVolume, Bollinger, Ema, Indicator, IndicatorSet, Macd, RollingExtreme, Rsi, Sma,
    Supertrend,
};
use vcplab_core::pattern::{alternating_extrema, analyze_vcp, VcpCriteria};
use vcplab_core::signals::advise;
use vcplab_core::trend;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64 * 0.05 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            let high = close + 1.5;
            let low = close - 1.5;
            Bar {
                symbol: "BENCH".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
                adj_close: close,
            }
        })
        .collect()
}

fn make_series(n: usize) -> PriceSeries {
    PriceSeries::from_bars(make_bars(n))
}

fn screening_stack() -> Vec<Box<dyn Indicator>> {
    vec![
        Box::new(Sma::new(50)),
        Box::new(Sma::new(150)),
        Box::new(Sma::new(200)),
        Box::new(Ema::new(200)),
        Box::new(Rsi::new(14)),
        Box::new(Macd::signal(12, 26, 9)),
        Box::new(Atr::new(14)),
        Box::new(Supertrend::new(12, 3.0)),
        Box::new(Bollinger::upper(30, 2.0)),
        Box::new(Bollinger::lower(30, 2.0)),
        Box::new(AvgVolume::new(30)),
        Box::new(RollingExtreme::highest_high(260)),
        Box::new(RollingExtreme::lowest_low(260)),
    ]
}

// ── 1. Indicator Batch ───────────────────────────────────────────────

fn bench_indicator_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_batch");

    for &bar_count in &[252, 1260, 2520] {
        let bars = make_bars(bar_count);
        let stack = screening_stack();

        group.bench_with_input(
            BenchmarkId::new("full_stack_13", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    let mut set = IndicatorSet::new();
                    for ind in &stack {
                        set.add(ind.as_ref(), black_box(&bars));
                    }
                    black_box(&set);
                });
            },
        );
    }

    group.finish();
}

// ── 2. Trend Template ────────────────────────────────────────────────

fn bench_trend_template(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend_template");

    for &bar_count in &[300, 1300] {
        let series = make_series(bar_count);
        let benchmark = make_series(bar_count);

        group.bench_with_input(
            BenchmarkId::new("evaluate", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| trend::evaluate(black_box(&series), black_box(&benchmark)));
            },
        );
    }

    group.finish();
}

// ── 3. Extrema + Contraction Analysis ────────────────────────────────

fn bench_pattern_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_analysis");

    for &bar_count in &[252, 2520] {
        let bars = make_bars(bar_count);
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

        group.bench_with_input(
            BenchmarkId::new("alternating_extrema", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| alternating_extrema(black_box(&highs), black_box(&lows), 10));
            },
        );

        let series = PriceSeries::from_bars(bars);
        let criteria = VcpCriteria::default();
        group.bench_with_input(
            BenchmarkId::new("analyze_vcp", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| analyze_vcp(black_box(&series), black_box(&criteria)));
            },
        );
    }

    group.finish();
}

// ── 4. Signal Advisor ────────────────────────────────────────────────

fn bench_advisor(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_advisor");

    let series = make_series(300);
    group.bench_function("advise_300_bars", |b| {
        b.iter(|| advise(black_box(&series)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_indicator_batch,
    bench_trend_template,
    bench_pattern_analysis,
    bench_advisor,
);
criterion_main!(benches);
