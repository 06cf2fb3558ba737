//! Indicator library.
//!
//! Indicators are pure functions: bar history in, numeric series out. Each
//! output series has the same length as the input and carries `f64::NAN`
//! during warm-up, never a fabricated zero. Downstream rules treat NaN as
//! "not yet determined" and fail closed.
//!
//! Multi-series indicators (Bollinger, MACD) are exposed as separate named
//! instances per output, keeping the single-series `Indicator` trait
//! unchanged.

use std::collections::HashMap;

use crate::domain::Bar;

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod range;
pub mod rsi;
pub mod sma;
pub mod supertrend;
pub mod volume;

pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use ema::Ema;
pub use macd::{Macd, MacdOutput};
pub use range::{ExtremeKind, RollingExtreme};
pub use rsi::Rsi;
pub use sma::Sma;
pub use supertrend::Supertrend;
pub use volume::AvgVolume;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values should be `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_50", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    /// The first `lookback()` values should be `f64::NAN`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Container for precomputed indicator series, keyed by indicator name.
///
/// Built once per symbol, then queried by bar index during classification.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute an indicator over `bars` and store it under its name.
    pub fn add(&mut self, indicator: &dyn Indicator, bars: &[Bar]) {
        self.series
            .insert(indicator.name().to_string(), indicator.compute(bars));
    }

    /// Insert a precomputed series under an explicit name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the value at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Bar {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000,
                adj_close: close,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
