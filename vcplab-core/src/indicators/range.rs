//! Rolling price extremes.
//!
//! Highest high / lowest low over a trailing window, used for the 52-week
//! checks in the trend template (window 260, clamped to the series length
//! by the caller when the history is shorter).
//!
//! Full-window semantics: NaN until the window fills, like every other
//! warm-up in this crate.
//! Lookback: period - 1.

use crate::domain::Bar;
use crate::indicators::Indicator;

/// Which extreme to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremeKind {
    HighestHigh,
    LowestLow,
}

#[derive(Debug, Clone)]
pub struct RollingExtreme {
    period: usize,
    kind: ExtremeKind,
    name: String,
}

impl RollingExtreme {
    pub fn highest_high(period: usize) -> Self {
        assert!(period >= 1, "RollingExtreme period must be >= 1");
        Self {
            period,
            kind: ExtremeKind::HighestHigh,
            name: format!("highest_high_{period}"),
        }
    }

    pub fn lowest_low(period: usize) -> Self {
        assert!(period >= 1, "RollingExtreme period must be >= 1");
        Self {
            period,
            kind: ExtremeKind::LowestLow,
            name: format!("lowest_low_{period}"),
        }
    }
}

impl Indicator for RollingExtreme {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[(i + 1 - self.period)..=i];
            let mut extreme = match self.kind {
                ExtremeKind::HighestHigh => f64::NEG_INFINITY,
                ExtremeKind::LowestLow => f64::INFINITY,
            };
            let mut has_nan = false;
            for bar in window {
                let v = match self.kind {
                    ExtremeKind::HighestHigh => bar.high,
                    ExtremeKind::LowestLow => bar.low,
                };
                if v.is_nan() {
                    has_nan = true;
                    break;
                }
                extreme = match self.kind {
                    ExtremeKind::HighestHigh => extreme.max(v),
                    ExtremeKind::LowestLow => extreme.min(v),
                };
            }
            if !has_nan {
                result[i] = extreme;
            }
        }

        result
    }
}
