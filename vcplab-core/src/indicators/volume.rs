//! Average volume.
//!
//! Rolling mean of share volume. The VCP check compares the 5-day average
//! against the 30-day average to confirm volume dry-up into the pivot.
//! Lookback: period - 1.

use crate::domain::Bar;
use crate::indicators::sma::rolling_mean;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct AvgVolume {
    period: usize,
    name: String,
}

impl AvgVolume {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "AvgVolume period must be >= 1");
        Self {
            period,
            name: format!("avg_volume_{period}"),
        }
    }
}

impl Indicator for AvgVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
        rolling_mean(&volumes, self.period)
    }
}
