//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window. The trend template
//! reads this at periods 50, 150 and 200; the signal advisor at 7 and 25.
//! Lookback: period - 1 (first valid value at index period-1).

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(&bars.iter().map(|b| b.close).collect::<Vec<f64>>(), self.period)
    }
}

/// Rolling mean over a plain series. A window containing NaN yields NaN;
/// indices before the window fills are NaN.
pub fn rolling_mean(series: &[f64], period: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &series[(i + 1 - period)..=i];
        let mut sum = 0.0;
        let mut has_nan = false;
        for &v in window {
            if v.is_nan() {
                has_nan = true;
                break;
            }
            sum += v;
        }
        if !has_nan {
            result[i] = sum / period as f64;
        }
    }

    result
}
