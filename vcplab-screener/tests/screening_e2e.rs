//! End-to-end screening over canned providers.
//!
//! A synthetic 300-bar series carries a complete contraction pattern on top
//! of a year-long ramp: three pullbacks of 10%, 13.64% and 6.67%, the
//! newest two tightening, drying volume, and a finish below the 105 pivot.
//! `run_screen` is driven over it with static providers and a temp-dir
//! cache, checking what reaches the radar, how reruns behave, and when the
//! run halts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use vcplab_core::data::{
    DataError, DataSource, FetchResult, ParquetCache, PriceProvider, UniverseProvider,
};
use vcplab_core::domain::{Bar, PriceSeries};
use vcplab_core::pattern::VcpCriteria;
use vcplab_screener::{analyze_ticker, run_screen, Radar, ScreenError, ScreenerConfig};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Piecewise-linear closes through (index, value) anchors covering 0..n.
fn path_through(anchors: &[(usize, f64)], n: usize) -> Vec<f64> {
    let mut path = vec![0.0; n];
    for pair in anchors.windows(2) {
        let (i0, v0) = pair[0];
        let (i1, v1) = pair[1];
        let span = (i1 - i0) as f64;
        for i in i0..=i1 {
            path[i] = v0 + (v1 - v0) * (i - i0) as f64 / span;
        }
    }
    path
}

fn bars_from_path(symbol: &str, path: &[f64], volumes: &[u64]) -> Vec<Bar> {
    let base = date(2023, 1, 2);
    path.iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&p, &volume))| Bar {
            symbol: symbol.to_string(),
            date: base + Duration::days(i as i64),
            open: p,
            high: p,
            low: p,
            close: p,
            volume,
            adj_close: p,
        })
        .collect()
}

/// The candidate: ramps 60 to 100 over a year, then pulls back 10%, 13.64%
/// and 6.67% with highs at 100, 110 and 105, and recovers to 103 on dry
/// volume. The newest two legs tighten, so two contractions are counted
/// from the 110 high.
fn vcp_bars(symbol: &str) -> Vec<Bar> {
    let n = 300;
    let anchors = [
        (0, 60.0),
        (254, 100.0),
        (262, 90.0),
        (272, 110.0),
        (280, 95.0),
        (288, 105.0),
        (294, 98.0),
        (299, 103.0),
    ];
    let path = path_through(&anchors, n);
    let mut volumes = vec![2_000_000u64; n];
    for v in volumes.iter_mut().skip(n - 5) {
        *v = 400_000;
    }
    bars_from_path(symbol, &path, &volumes)
}

fn flat_bars(symbol: &str, n: usize, level: f64) -> Vec<Bar> {
    bars_from_path(symbol, &vec![level; n], &vec![1_500_000u64; n])
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

struct StaticPrices {
    histories: HashMap<String, Vec<Bar>>,
    fetches: AtomicUsize,
    halt_on: Option<String>,
}

impl StaticPrices {
    fn new(histories: HashMap<String, Vec<Bar>>) -> Self {
        Self {
            histories,
            fetches: AtomicUsize::new(0),
            halt_on: None,
        }
    }
}

impl PriceProvider for StaticPrices {
    fn name(&self) -> &str {
        "static_prices"
    }

    fn fetch_daily(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.halt_on.as_deref() == Some(symbol) {
            return Err(DataError::CircuitBreakerTripped);
        }
        let bars = self
            .histories
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

struct StaticUniverse {
    universe: Vec<String>,
    ranking: Vec<String>,
    calls: AtomicUsize,
}

impl StaticUniverse {
    fn new(universe: &[&str], ranking: &[&str]) -> Self {
        Self {
            universe: strings(universe),
            ranking: strings(ranking),
            calls: AtomicUsize::new(0),
        }
    }
}

impl UniverseProvider for StaticUniverse {
    fn name(&self) -> &str {
        "static_universe"
    }

    fn liquid_universe(&self) -> Result<Vec<String>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.universe.clone())
    }

    fn performance_order(&self) -> Result<Vec<String>, DataError> {
        Ok(self.ranking.clone())
    }
}

fn test_config(tmp: &TempDir) -> ScreenerConfig {
    let mut config = ScreenerConfig::default();
    config.paths.cache_dir = tmp.path().join("cache");
    config.paths.radar_path = tmp.path().join("radar.jsonl");
    config.paths.snapshot_dir = tmp.path().join("snapshots");
    config.paths.options_journal_path = tmp.path().join("options.jsonl");
    config.data.benchmark = "BENCH".to_string();
    config
}

fn candidate_histories() -> HashMap<String, Vec<Bar>> {
    let mut histories = HashMap::new();
    histories.insert("VCPX".to_string(), vcp_bars("VCPX"));
    histories.insert("FLAT".to_string(), flat_bars("FLAT", 300, 100.0));
    histories.insert("BENCH".to_string(), flat_bars("BENCH", 300, 100.0));
    histories
}

#[test]
fn synthetic_series_carries_the_full_pattern() {
    let series = PriceSeries::from_bars(vcp_bars("VCPX"));
    let benchmark = PriceSeries::from_bars(flat_bars("BENCH", 300, 100.0));

    let analysis = analyze_ticker(&series, &benchmark, &VcpCriteria::default());
    assert!(analysis.stage2, "trend template should pass");
    let reading = analysis.vcp.expect("contraction sequence expected");
    assert!(reading.flags.all(), "flags: {:?}", reading.flags);

    // The 10% leg precedes the 13.64% one, so only the newest two count.
    assert_eq!(reading.stats.num_contractions, 2);
    assert_eq!(reading.stats.max_contraction_pct, 13.64);
    assert_eq!(reading.stats.min_contraction_pct, 6.67);
    // Counted from the 110 high at bar 272: (300 - 272) / 5 weeks.
    assert_eq!(reading.stats.weeks_of_contraction, 5.6);
}

#[test]
fn screen_puts_the_candidate_on_the_radar() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let cache = ParquetCache::new(&config.paths.cache_dir);
    let today = date(2024, 6, 3);

    let prices = StaticPrices::new(candidate_histories());
    // VCPX ranks second of five: rating 80, above the default 70 cutoff.
    let universe = StaticUniverse::new(
        &["VCPX", "FLAT", "GONE"],
        &["AAA", "VCPX", "BBB", "CCC", "DDD"],
    );

    let summary = run_screen(&config, &prices, &universe, &cache, today).unwrap();

    assert_eq!(summary.run_date, today);
    assert_eq!(summary.run_id, config.run_id(today));
    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.skipped, 1, "GONE has no history");
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.appended, 1);

    let hit = &summary.results[0];
    assert_eq!(hit.ticker, "VCPX");
    assert_eq!(hit.rs_rating, 80);
    assert_eq!(hit.num_contractions, 2);
    assert_eq!(hit.max_contraction_pct, 13.64);
    assert_eq!(hit.run_date, today);

    let entries = Radar::new(&config.paths.radar_path).read_all().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(&entries[0], hit);
}

#[test]
fn same_day_rerun_reuses_the_snapshot_and_appends_nothing() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let cache = ParquetCache::new(&config.paths.cache_dir);
    let today = date(2024, 6, 3);

    let prices = StaticPrices::new(candidate_histories());
    let universe = StaticUniverse::new(&["VCPX", "FLAT"], &["AAA", "VCPX", "BBB", "CCC", "DDD"]);

    let first = run_screen(&config, &prices, &universe, &cache, today).unwrap();
    assert_eq!(first.appended, 1);
    let fetches_after_first = prices.fetches.load(Ordering::SeqCst);

    let second = run_screen(&config, &prices, &universe, &cache, today).unwrap();
    assert_eq!(second.results.len(), 1);
    assert_eq!(second.appended, 0, "rerun must not duplicate radar lines");

    // The day snapshot answers the second run; the universe was pulled once.
    assert_eq!(universe.calls.load(Ordering::SeqCst), 1);
    // Histories come from the fresh cache, not another download.
    assert_eq!(prices.fetches.load(Ordering::SeqCst), fetches_after_first);

    let entries = Radar::new(&config.paths.radar_path).read_all().unwrap();
    assert_eq!(entries.len(), 1);
}

#[test]
fn low_rs_candidate_stays_off_the_radar() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let cache = ParquetCache::new(&config.paths.cache_dir);
    let today = date(2024, 6, 3);

    let prices = StaticPrices::new(candidate_histories());
    // Third of four: rating 50, under the default 70 cutoff.
    let universe = StaticUniverse::new(&["VCPX"], &["AAA", "BBB", "VCPX", "DDD"]);

    let summary = run_screen(&config, &prices, &universe, &cache, today).unwrap();

    assert!(summary.results.is_empty());
    assert_eq!(summary.appended, 0);
    assert_eq!(summary.skipped, 0, "an RS rejection is not a data failure");
}

#[test]
fn tripped_breaker_halts_the_run() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let cache = ParquetCache::new(&config.paths.cache_dir);
    let today = date(2024, 6, 3);

    let mut prices = StaticPrices::new(candidate_histories());
    prices.halt_on = Some("HALT".to_string());
    let universe = StaticUniverse::new(&["VCPX", "HALT"], &["AAA", "VCPX", "BBB"]);

    let err = run_screen(&config, &prices, &universe, &cache, today).unwrap_err();
    match err {
        ScreenError::Halted { symbol, source } => {
            assert_eq!(symbol, "HALT");
            assert!(matches!(source, DataError::CircuitBreakerTripped));
        }
        other => panic!("expected Halted, got {other:?}"),
    }

    // A halted run writes nothing to the radar.
    assert!(!config.paths.radar_path.exists());
}
