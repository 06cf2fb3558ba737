//! Exponential Moving Average (EMA).
//!
//! Recursive EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1] with
//! alpha = 2/(period+1), seeded by the SMA of the first `period` values.
//! The advisor's 200-bar regime filter and both MACD legs run through
//! here. Lookback: period - 1.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA over a plain f64 slice.
///
/// A NaN first value or a NaN inside the seed window blanks the whole
/// output; a NaN after the seed blanks the remainder only.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    match values.first() {
        Some(v) if !v.is_nan() => ema_from_first_valid(values, period),
        _ => vec![f64::NAN; values.len()],
    }
}

/// EMA that tolerates a NaN warm-up prefix.
///
/// Skips leading NaN, seeds with the mean of the first `period` values after
/// the prefix, and recurses from there. The MACD signal line needs this: its
/// input is the MACD line, which is NaN until the slow EMA fills.
pub fn ema_from_first_valid(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }

    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };
    if n - start < period {
        return result;
    }

    let mut sum = 0.0;
    for &v in &values[start..start + period] {
        if v.is_nan() {
            return result;
        }
        sum += v;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed_end = start + period - 1;
    let mut prev = sum / period as f64;
    result[seed_end] = prev;

    for i in (seed_end + 1)..n {
        let v = values[i];
        if v.is_nan() {
            break;
        }
        prev = alpha * v + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}
