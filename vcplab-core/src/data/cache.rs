//! Parquet bar cache.
//!
//! Layout: `{cache_dir}/symbol={SYMBOL}/daily.parquet` plus a `meta.json`
//! sidecar carrying the date range, a BLAKE3 hash of the bar data, and the
//! day the fetch happened. A symbol fetched earlier the same day is fresh
//! and is never re-downloaded, which is what makes a screening run
//! repeatable within a day.
//!
//! Writes go to a `.tmp` file first and rename into place. Files that fail
//! to read back, or whose contents no longer match the recorded hash, are
//! quarantined rather than deleted so they can be inspected.

use super::provider::{DataError, DataSource};
use crate::domain::Bar;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata sidecar for a cached symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: DataSource,
    pub fetched_on: NaiveDate,
}

impl CacheMeta {
    /// Whether the cached data was fetched on the given day.
    pub fn is_fresh(&self, today: NaiveDate) -> bool {
        self.fetched_on == today
    }
}

/// Cache state for one symbol, for status listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub symbol: String,
    pub cached: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub bar_count: Option<usize>,
    pub fetched_on: Option<NaiveDate>,
}

pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("symbol={symbol}"))
    }

    fn data_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join("daily.parquet")
    }

    fn meta_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join("meta.json")
    }

    /// Store bars for a symbol, replacing any previous data.
    ///
    /// Bars are written oldest first regardless of input order. `today`
    /// becomes the freshness stamp in the sidecar.
    pub fn store(
        &self,
        symbol: &str,
        bars: &[Bar],
        source: DataSource,
        today: NaiveDate,
    ) -> Result<(), DataError> {
        if bars.is_empty() {
            return Err(DataError::CacheError("no bars to cache".into()));
        }

        let mut sorted: Vec<Bar> = bars.to_vec();
        sorted.sort_by_key(|b| b.date);

        let sym_dir = self.symbol_dir(symbol);
        fs::create_dir_all(&sym_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let df = bars_to_dataframe(&sorted)?;
        let path = self.data_path(symbol);
        let tmp_path = path.with_extension("parquet.tmp");

        write_parquet(&df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            symbol: symbol.to_string(),
            start_date: sorted[0].date,
            end_date: sorted[sorted.len() - 1].date,
            bar_count: sorted.len(),
            data_hash: bars_hash(&sorted),
            source,
            fetched_on: today,
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(symbol), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Load cached bars for a symbol, oldest first.
    ///
    /// A file that fails to parse or no longer matches its recorded hash
    /// is quarantined and reported as missing.
    pub fn load(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let path = self.data_path(symbol);
        if !path.exists() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }

        let bars = match read_and_validate(&path, symbol) {
            Ok(bars) => bars,
            Err(e) => {
                self.quarantine(&path, &e);
                return Err(DataError::NoCachedData {
                    symbol: symbol.to_string(),
                });
            }
        };

        if let Some(meta) = self.meta(symbol) {
            if meta.data_hash != bars_hash(&bars) {
                self.quarantine(
                    &path,
                    &DataError::ValidationError("data hash mismatch".into()),
                );
                return Err(DataError::NoCachedData {
                    symbol: symbol.to_string(),
                });
            }
        }

        Ok(bars)
    }

    fn quarantine(&self, path: &Path, reason: &DataError) {
        let quarantined = path.with_extension("parquet.quarantined");
        tracing::warn!(
            path = %path.display(),
            %reason,
            "quarantining corrupt cache file"
        );
        let _ = fs::rename(path, &quarantined);
    }

    /// Read the metadata sidecar for a symbol.
    pub fn meta(&self, symbol: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(symbol)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Whether the symbol was cached today and can skip the network.
    pub fn is_fresh(&self, symbol: &str, today: NaiveDate) -> bool {
        self.meta(symbol).is_some_and(|m| m.is_fresh(today))
    }

    /// All symbols present in the cache, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        let mut symbols: Vec<String> = entries
            .filter_map(|entry| {
                let name = entry.ok()?.file_name().into_string().ok()?;
                name.strip_prefix("symbol=").map(String::from)
            })
            .collect();
        symbols.sort();
        symbols
    }

    /// Cache state for each requested symbol.
    pub fn status(&self, symbols: &[&str]) -> Vec<CacheStatus> {
        symbols
            .iter()
            .map(|sym| {
                let meta = self.meta(sym);
                CacheStatus {
                    symbol: sym.to_string(),
                    cached: meta.is_some(),
                    start_date: meta.as_ref().map(|m| m.start_date),
                    end_date: meta.as_ref().map(|m| m.end_date),
                    bar_count: meta.as_ref().map(|m| m.bar_count),
                    fetched_on: meta.as_ref().map(|m| m.fetched_on),
                }
            })
            .collect()
    }
}

/// Deterministic BLAKE3 hash over date and OHLCV bytes, oldest first.
fn bars_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
        hasher.update(&bar.adj_close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ── Parquet I/O ────────────────────────────────────────────────────

fn bars_to_dataframe(bars: &[Bar]) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();
    let adj_closes: Vec<f64> = bars.iter().map(|b| b.adj_close).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new("adj_close".into(), adj_closes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn read_and_validate(path: &Path, symbol: &str) -> Result<Vec<Bar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    for col_name in ["date", "open", "high", "low", "close", "volume", "adj_close"] {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    dataframe_to_bars(&df, symbol)
}

fn dataframe_to_bars(df: &DataFrame, symbol: &str) -> Result<Vec<Bar>, DataError> {
    let col = |name: &str| {
        df.column(name)
            .map_err(|e| DataError::ParquetError(format!("column read: {e}")))
    };

    let date_ca = col("date")?
        .date()
        .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?
        .clone();
    let f64_col = |name: &str| -> Result<Float64Chunked, DataError> {
        Ok(col(name)?
            .f64()
            .map_err(|e| DataError::ParquetError(format!("{name} column type: {e}")))?
            .clone())
    };
    let open_ca = f64_col("open")?;
    let high_ca = f64_col("high")?;
    let low_ca = f64_col("low")?;
    let close_ca = f64_col("close")?;
    let adj_ca = f64_col("adj_close")?;
    let vol_ca = col("volume")?
        .u64()
        .map_err(|e| DataError::ParquetError(format!("volume column type: {e}")))?
        .clone();

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let mut bars = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let date_days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
        bars.push(Bar {
            symbol: symbol.to_string(),
            date: epoch + chrono::Duration::days(date_days as i64),
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(0),
            adj_close: adj_ca.get(i).unwrap_or(f64::NAN),
        });
    }

    Ok(bars)
}
