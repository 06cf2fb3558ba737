//! External data: providers, caching, and offline fallbacks.

pub mod cache;
pub mod circuit_breaker;
pub mod download;
pub mod finviz;
pub mod options;
pub mod provider;
pub mod synthetic;
pub mod watchlist;
pub mod yahoo;

pub use cache::{CacheMeta, CacheStatus, ParquetCache};
pub use circuit_breaker::CircuitBreaker;
pub use download::{download_symbols, DownloadProgress, DownloadSummary, StdoutProgress};
pub use finviz::FinvizScreener;
pub use options::{Fundamentals, OptionsProvider, OptionsSnapshot, YahooOptionsProvider};
pub use provider::{DataError, DataSource, FetchResult, PriceProvider, UniverseProvider};
pub use synthetic::synthetic_daily_bars;
pub use watchlist::Watchlist;
pub use yahoo::YahooDailyProvider;
