//! Provider traits and structured error types for external data.
//!
//! Traits split the outside world by concern: daily bars (`PriceProvider`)
//! and ticker universes (`UniverseProvider`) here, options chains plus
//! fundamentals (`OptionsProvider`, in `options.rs`). The screener takes
//! trait objects so tests can substitute canned sources.

use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("no cached data for symbol '{symbol}' — run `download {symbol}` first")]
    NoCachedData { symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// True when the run should stop instead of skipping to the next symbol.
    ///
    /// Per-symbol failures (missing data, parse trouble) skip the symbol
    /// with a warning. A tripped breaker or an auth wall means every
    /// remaining request would fail the same way.
    pub fn halts_run(&self) -> bool {
        matches!(
            self,
            DataError::CircuitBreakerTripped | DataError::AuthenticationRequired(_)
        )
    }
}

/// Where a bar series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Finviz,
    Cache,
    Synthetic,
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Daily OHLCV bar source.
///
/// Implementations handle transport, retries, and rate limiting. The cache
/// layer sits above this trait; providers do not know about the cache.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a symbol over a date range, oldest first.
    fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError>;

    /// Whether the provider will currently accept requests.
    fn is_available(&self) -> bool;
}

/// Ticker universe source.
///
/// The screener needs two lists: the liquid universe to scan, and a
/// broader list ordered by yearly performance for relative strength.
pub trait UniverseProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Tickers passing the liquidity and trend pre-filters, in ticker order.
    fn liquid_universe(&self) -> Result<Vec<String>, DataError>;

    /// Tickers ordered best to worst by 52-week performance.
    fn performance_order(&self) -> Result<Vec<String>, DataError>;
}
