//! The daily VCP screen — wires providers, cache, analysis, and radar together.
//!
//! Two entry points:
//! - `run_screen()`: full run against live providers and the cache. Used by CLI.
//! - `analyze_ticker()`: pure analysis of one series. No I/O; used by tests.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcplab_core::data::{DataError, ParquetCache, PriceProvider, UniverseProvider};
use vcplab_core::domain::{Bar, PriceSeries};
use vcplab_core::pattern::{analyze_vcp, VcpCriteria, VcpReading};
use vcplab_core::ranking::RsTable;
use vcplab_core::trend::{evaluate, is_stage2};

use crate::config::ScreenerConfig;
use crate::radar::{Radar, RadarError, ScreeningResult};
use crate::snapshot::{RunSnapshot, SnapshotStore};

/// Errors that abort a screening run.
///
/// Per-ticker data failures are not here: those are logged and skipped.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("universe provider failed: {0}")]
    Universe(#[source] DataError),

    #[error("benchmark history failed: {0}")]
    Benchmark(#[source] DataError),

    #[error("snapshot store: {0}")]
    Snapshot(#[from] std::io::Error),

    #[error("radar store: {0}")]
    Radar(#[from] RadarError),

    #[error("run halted at {symbol}: {source}")]
    Halted { symbol: String, source: DataError },
}

/// Outcome of one screening run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenSummary {
    pub run_date: NaiveDate,
    pub run_id: String,
    /// Tickers examined
    pub scanned: usize,
    /// Tickers dropped for data errors
    pub skipped: usize,
    /// Tickers that passed the full screen
    pub results: Vec<ScreeningResult>,
    /// New radar lines written (reruns append zero)
    pub appended: usize,
}

/// Pure per-ticker analysis: trend gate plus contraction reading.
#[derive(Debug, Clone)]
pub struct TickerAnalysis {
    pub stage2: bool,
    pub vcp: Option<VcpReading>,
}

/// Analyze one series against the benchmark with no I/O.
///
/// The full screen layers RS rating and persistence on top of this; tests
/// drive it directly with crafted series. A series failing the trend gate
/// skips contraction analysis entirely.
pub fn analyze_ticker(
    series: &PriceSeries,
    benchmark: &PriceSeries,
    criteria: &VcpCriteria,
) -> TickerAnalysis {
    let flags = evaluate(series, benchmark);
    if !is_stage2(&flags) {
        return TickerAnalysis {
            stage2: false,
            vcp: None,
        };
    }
    TickerAnalysis {
        stage2: true,
        vcp: analyze_vcp(series, criteria),
    }
}

/// Run the daily screen over the liquid universe.
///
/// Resolves (or reuses) the day's snapshot, screens every ticker, appends
/// hits to the radar, and returns the summary. Per-ticker data failures are
/// warned and skipped; an error that poisons every remaining request
/// (tripped breaker, auth wall) aborts with `ScreenError::Halted`.
pub fn run_screen(
    config: &ScreenerConfig,
    prices: &dyn PriceProvider,
    universe: &dyn UniverseProvider,
    cache: &ParquetCache,
    today: NaiveDate,
) -> Result<ScreenSummary, ScreenError> {
    let run_id = config.run_id(today);
    let snapshots = SnapshotStore::new(&config.paths.snapshot_dir);
    let snapshot = resolve_snapshot(config, prices, universe, cache, &snapshots, today)?;

    let rs_table = RsTable::new(snapshot.ranking.clone());
    let benchmark = PriceSeries::from_bars(snapshot.benchmark.clone());

    tracing::info!(
        run_date = %today,
        universe = snapshot.universe.len(),
        ranking = rs_table.len(),
        "starting screen"
    );

    // Build Rayon thread pool if the worker cap allows it
    let thread_pool = if config.data.workers > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.data.workers)
                .build()
                .expect("failed to build Rayon thread pool"),
        )
    } else {
        None
    };

    let outcomes: Vec<(String, Result<Option<ScreeningResult>, DataError>)> =
        if let Some(ref tp) = thread_pool {
            tp.install(|| {
                snapshot
                    .universe
                    .par_iter()
                    .map(|ticker| {
                        let result = screen_ticker(
                            ticker, config, prices, cache, &benchmark, &rs_table, &run_id,
                            today,
                        );
                        (ticker.clone(), result)
                    })
                    .collect()
            })
        } else {
            snapshot
                .universe
                .iter()
                .map(|ticker| {
                    let result = screen_ticker(
                        ticker, config, prices, cache, &benchmark, &rs_table, &run_id, today,
                    );
                    (ticker.clone(), result)
                })
                .collect()
        };

    // Triage results after the whole pass completes
    let mut results = Vec::new();
    let mut skipped = 0;
    for (ticker, outcome) in outcomes {
        match outcome {
            Ok(Some(result)) => results.push(result),
            Ok(None) => {}
            Err(e) if e.halts_run() => {
                return Err(ScreenError::Halted {
                    symbol: ticker,
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!(%ticker, error = %e, "skipping ticker");
                skipped += 1;
            }
        }
    }

    let radar = Radar::new(&config.paths.radar_path);
    let appended = radar.append_all(&results)?;

    tracing::info!(
        scanned = snapshot.universe.len(),
        skipped,
        hits = results.len(),
        appended,
        "screen complete"
    );

    Ok(ScreenSummary {
        run_date: today,
        run_id,
        scanned: snapshot.universe.len(),
        skipped,
        results,
        appended,
    })
}

/// Load the day's snapshot, or build one from the providers and save it.
fn resolve_snapshot(
    config: &ScreenerConfig,
    prices: &dyn PriceProvider,
    universe: &dyn UniverseProvider,
    cache: &ParquetCache,
    store: &SnapshotStore,
    today: NaiveDate,
) -> Result<RunSnapshot, ScreenError> {
    if let Some(snapshot) = store.load(today) {
        tracing::info!(run_date = %today, "reusing day snapshot");
        return Ok(snapshot);
    }

    let tickers = universe.liquid_universe().map_err(ScreenError::Universe)?;
    let ranking = universe.performance_order().map_err(ScreenError::Universe)?;
    let benchmark = fetch_or_cached(&config.data.benchmark, config, prices, cache, today)
        .map_err(ScreenError::Benchmark)?;

    let snapshot = RunSnapshot {
        run_date: today,
        universe: tickers,
        ranking,
        benchmark_symbol: config.data.benchmark.clone(),
        benchmark,
    };
    store.save(&snapshot)?;
    Ok(snapshot)
}

/// Screen one ticker end to end: history, trend gate, contraction flags,
/// RS cutoff.
///
/// `Ok(None)` means examined and rejected; `Err` carries a data failure for
/// the caller to triage.
#[allow(clippy::too_many_arguments)]
fn screen_ticker(
    ticker: &str,
    config: &ScreenerConfig,
    prices: &dyn PriceProvider,
    cache: &ParquetCache,
    benchmark: &PriceSeries,
    rs_table: &RsTable,
    run_id: &str,
    today: NaiveDate,
) -> Result<Option<ScreeningResult>, DataError> {
    let bars = fetch_or_cached(ticker, config, prices, cache, today)?;
    let series = PriceSeries::from_bars(bars);

    let flags = evaluate(&series, benchmark);
    if !is_stage2(&flags) {
        tracing::debug!(ticker, "not stage 2");
        return Ok(None);
    }

    let Some(reading) = analyze_vcp(&series, &config.criteria) else {
        tracing::debug!(ticker, "no contraction sequence");
        return Ok(None);
    };
    if !reading.flags.all() {
        tracing::debug!(ticker, flags = ?reading.flags, "contraction flags failed");
        return Ok(None);
    }

    let rs_rating = rs_table.rating(ticker);
    if rs_rating < config.rs_min {
        tracing::debug!(ticker, rs_rating, "below RS cutoff");
        return Ok(None);
    }

    Ok(Some(ScreeningResult::from_stats(
        ticker,
        &reading.stats,
        rs_rating,
        today,
        run_id,
    )))
}

/// Daily history for a symbol, from the cache when fresh today, otherwise
/// fetched and cached.
pub(crate) fn fetch_or_cached(
    symbol: &str,
    config: &ScreenerConfig,
    prices: &dyn PriceProvider,
    cache: &ParquetCache,
    today: NaiveDate,
) -> Result<Vec<Bar>, DataError> {
    if cache.is_fresh(symbol, today) {
        return cache.load(symbol);
    }
    let start = history_start(today, config.data.history_years);
    let fetched = prices.fetch_daily(symbol, start, today)?;
    cache.store(symbol, &fetched.bars, fetched.source, today)?;
    Ok(fetched.bars)
}

fn history_start(today: NaiveDate, years: u32) -> NaiveDate {
    today - Duration::days(i64::from(years) * 365)
}
