//! Average True Range (ATR).
//!
//! True range widens the plain high-low span by the gap from the prior
//! close, then Wilder smoothing (alpha = 1/period) averages it. The
//! supertrend bands are built from the same two helpers. Lookback: period
//! (TR needs a prior close, so the first value lands at index `period`).

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range per bar: max(high-low, |high-prev_close|, |low-prev_close|).
///
/// The first bar has no prior close and falls back to high-low. A NaN
/// high, low, or prior close yields NaN; `f64::max` alone would skip the
/// NaN operand and understate the range.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;
    bars.iter()
        .map(|bar| {
            let pc = prev_close.replace(bar.close);
            match pc {
                _ if bar.high.is_nan() || bar.low.is_nan() => f64::NAN,
                None => bar.high - bar.low,
                Some(pc) if pc.is_nan() => f64::NAN,
                Some(pc) => (bar.high - bar.low)
                    .max((bar.high - pc).abs())
                    .max((bar.low - pc).abs()),
            }
        })
        .collect()
}

/// Apply Wilder smoothing to a series. Alpha = 1/period.
///
/// Seeds with the mean of the first window of `period` consecutive non-NaN
/// values, so a NaN warm-up prefix (like a masked TR[0]) just shifts the
/// seed later. Past the seed, a hole leaves the prefix standing and the
/// remainder NaN.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    let Some(seed_start) = values
        .windows(period)
        .position(|w| w.iter().all(|v| !v.is_nan()))
    else {
        return result;
    };
    let seed_end = seed_start + period;

    let alpha = 1.0 / period as f64;
    let mut prev = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = prev;

    for i in seed_end..n {
        let v = values[i];
        if v.is_nan() {
            break;
        }
        prev += alpha * (v - prev);
        result[i] = prev;
    }

    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut tr = true_range(bars);
        // The first bar's range is high-low only, not a true range. Mask it
        // so the seed forms over proper values and lands at index `period`.
        if !tr.is_empty() {
            tr[0] = f64::NAN;
        }
        wilder_smooth(&tr, self.period)
    }
}

#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            symbol: "TEST".to_string(),
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
            adj_close: close,
        })
        .collect()
}
