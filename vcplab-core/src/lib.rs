//! VcpLab Core — domain types, indicators, trend template, contraction analysis.
//!
//! This crate contains the analytical heart of the screener:
//! - Domain types (bars, price series, screening records)
//! - Indicator library with explicit warm-up semantics (NaN, never zero)
//! - Minervini trend template with nine named conditions
//! - Local extrema detection and contraction-sequence analysis
//! - Relative strength ranking against a benchmark index
//! - Rule-based signal advisor (moving averages, bands, MACD, Supertrend)
//! - Data providers (Yahoo chart API, Finviz exports) with parquet caching

pub mod calendar;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod pattern;
pub mod ranking;
pub mod signals;
pub mod trend;
