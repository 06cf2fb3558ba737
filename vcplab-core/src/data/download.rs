//! Batch downloads — fetch and cache many symbols with progress reporting.

use chrono::NaiveDate;

use super::cache::ParquetCache;
use super::provider::{DataError, PriceProvider};

/// Progress callback for multi-symbol downloads.
pub trait DownloadProgress: Send {
    /// Called before a symbol is fetched (or found fresh in the cache).
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called after a symbol resolves; `Ok` carries the cached bar count.
    fn on_complete(
        &self,
        symbol: &str,
        index: usize,
        total: usize,
        result: &Result<usize, DataError>,
    );

    /// Called once after the whole batch.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that prints one line per symbol.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {symbol}...", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        result: &Result<usize, DataError>,
    ) {
        match result {
            Ok(bars) => println!("  OK: {symbol} ({bars} bars)"),
            Err(e) => println!("  FAIL: {symbol}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nDownload complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Summary of a batch download.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Download symbols into the cache, skipping ones already fetched today.
///
/// `force` re-downloads regardless of freshness. When the provider stops
/// accepting requests mid-batch (circuit breaker), the remaining symbols
/// are marked failed without being attempted.
#[allow(clippy::too_many_arguments)]
pub fn download_symbols(
    provider: &dyn PriceProvider,
    cache: &ParquetCache,
    symbols: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    force: bool,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = symbols.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        if !force && cache.is_fresh(symbol, today) {
            let bars = cache.meta(symbol).map(|m| m.bar_count).unwrap_or(0);
            progress.on_complete(symbol, i, total, &Ok(bars));
            succeeded += 1;
            continue;
        }

        let result = download_single(provider, cache, symbol, start, end, today);
        progress.on_complete(symbol, i, total, &result);

        match result {
            Ok(_) => succeeded += 1,
            Err(e) => {
                errors.push((symbol.to_string(), e));
                failed += 1;
            }
        }

        // Stop early once the provider refuses further requests.
        if !provider.is_available() {
            for sym in &symbols[(i + 1)..total] {
                errors.push((sym.to_string(), DataError::CircuitBreakerTripped));
                failed += 1;
            }
            break;
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

/// Fetch one symbol and store it, returning the cached bar count.
fn download_single(
    provider: &dyn PriceProvider,
    cache: &ParquetCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<usize, DataError> {
    let fetched = provider.fetch_daily(symbol, start, end)?;
    cache.store(symbol, &fetched.bars, fetched.source, today)?;
    Ok(fetched.bars.len())
}
