//! Supertrend — ATR-band trend state.
//!
//! Bands: hl2 +/- multiplier * ATR(period). Each bar's close is compared
//! against the PREVIOUS bar's final bands: above the prior upper band flips
//! the state up, below the prior lower band flips it down, otherwise the
//! state carries. While carrying, the active band only tightens (the lower
//! band never falls in an uptrend, the upper never rises in a downtrend)
//! and the inactive band is discarded so it cannot trigger a flip later.
//!
//! Output: 1.0 when trending up, 0.0 when trending down, NaN during ATR
//! warm-up. The first bar with a valid ATR seeds the state as up.
//! Lookback: period.

use crate::domain::Bar;
use crate::indicators::atr::{true_range, wilder_smooth};
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Supertrend {
    period: usize,
    multiplier: f64,
    name: String,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Supertrend period must be >= 1");
        Self {
            period,
            multiplier,
            name: format!("supertrend_{period}_{multiplier}"),
        }
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        let mut tr = true_range(bars);
        if !tr.is_empty() {
            tr[0] = f64::NAN;
        }
        let atr = wilder_smooth(&tr, self.period);

        let Some(start) = atr.iter().position(|v| !v.is_nan()) else {
            return result;
        };

        let mut upper = vec![f64::NAN; n];
        let mut lower = vec![f64::NAN; n];
        for i in start..n {
            let hl2 = (bars[i].high + bars[i].low) / 2.0;
            upper[i] = hl2 + self.multiplier * atr[i];
            lower[i] = hl2 - self.multiplier * atr[i];
        }

        // Seed bar: no prior bands to compare against, state starts up.
        let mut up = true;
        upper[start] = f64::NAN;
        result[start] = 1.0;

        for i in (start + 1)..n {
            let close = bars[i].close;
            // NaN band or NaN close fails both comparisons and carries.
            if close > upper[i - 1] {
                up = true;
            } else if close < lower[i - 1] {
                up = false;
            } else {
                if up && lower[i] < lower[i - 1] {
                    lower[i] = lower[i - 1];
                }
                if !up && upper[i] > upper[i - 1] {
                    upper[i] = upper[i - 1];
                }
            }

            // Only the active band survives to the next bar's comparison.
            if up {
                upper[i] = f64::NAN;
            } else {
                lower[i] = f64::NAN;
            }
            result[i] = if up { 1.0 } else { 0.0 };
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::atr::make_ohlc_bars;

    #[test]
    fn supertrend_steady_uptrend_stays_up() {
        let mut data = Vec::new();
        for i in 0..15 {
            let base = 100.0 + i as f64 * 2.0;
            data.push((base - 1.0, base + 3.0, base - 3.0, base + 1.0));
        }
        let bars = make_ohlc_bars(&data);
        let result = Supertrend::new(3, 2.0).compute(&bars);

        for v in &result[..3] {
            assert!(v.is_nan());
        }
        for (i, v) in result.iter().enumerate().skip(3) {
            assert_eq!(*v, 1.0, "expected uptrend at bar {i}");
        }
    }

    #[test]
    fn supertrend_flips_down_and_recovers() {
        // period=2, mult=1.0, hand-computed:
        // ATR seeds at index 2 (atr=2), state up.
        // Bars 3-4 carry up. Bar 5 closes at 11.2, below the prior lower
        // band of 12 -> down. Bar 6 carries down. Bar 7 closes at 15.5,
        // above the prior upper band -> up again.
        let bars = make_ohlc_bars(&[
            (10.0, 11.0, 9.0, 10.0),
            (10.0, 12.0, 10.0, 11.0),
            (11.0, 13.0, 11.0, 12.0),
            (12.0, 14.0, 12.0, 13.0),
            (13.0, 15.0, 13.0, 14.0),
            (14.0, 14.5, 11.0, 11.2),
            (11.0, 11.5, 10.0, 10.5),
            (10.5, 16.0, 10.5, 15.5),
        ]);
        let result = Supertrend::new(2, 1.0).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_eq!(result[2], 1.0);
        assert_eq!(result[3], 1.0);
        assert_eq!(result[4], 1.0);
        assert_eq!(result[5], 0.0);
        assert_eq!(result[6], 0.0);
        assert_eq!(result[7], 1.0);
    }

    #[test]
    fn supertrend_upper_band_ratchets_in_downtrend() {
        // After the flip down at bar 5 the upper band is 15.5. Bar 6 has a
        // wide range whose basic upper band (16.375) would loosen it; the
        // ratchet holds 15.5. Bar 7 closes at 16.0: above 15.5 but below
        // 16.375, so the flip back up happens only because of the ratchet.
        let bars = make_ohlc_bars(&[
            (10.0, 11.0, 9.0, 10.0),
            (10.0, 12.0, 10.0, 11.0),
            (11.0, 13.0, 11.0, 12.0),
            (12.0, 14.0, 12.0, 13.0),
            (13.0, 15.0, 13.0, 14.0),
            (14.0, 14.5, 11.0, 11.2),
            (11.0, 15.0, 9.0, 10.0),
            (10.0, 16.2, 10.0, 16.0),
        ]);
        let result = Supertrend::new(2, 1.0).compute(&bars);

        assert_eq!(result[5], 0.0);
        assert_eq!(result[6], 0.0);
        assert_eq!(result[7], 1.0);
    }

    #[test]
    fn supertrend_warmup_is_nan_then_seeds_up() {
        let mut data = Vec::new();
        for i in 0..6 {
            let base = 50.0 + i as f64;
            data.push((base, base + 1.0, base - 1.0, base + 0.5));
        }
        let bars = make_ohlc_bars(&data);
        let result = Supertrend::new(3, 3.0).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_eq!(result[3], 1.0); // seed bar
    }

    #[test]
    fn supertrend_lookback_and_name() {
        let st = Supertrend::new(12, 3.0);
        assert_eq!(st.lookback(), 12);
        assert_eq!(st.name(), "supertrend_12_3");
    }

    #[test]
    fn supertrend_too_few_bars() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0)]);
        let result = Supertrend::new(3, 2.0).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
