//! Relative Strength Index (RSI).
//!
//! Wilder's RSI: seed averages over the first `period` close-to-close
//! changes, then exponential smoothing with alpha = 1/period. The signal
//! advisor reads `rsi_14` against its 20/80 oversold/overbought bands.
//! Lookback: period (the first valid value needs period changes).

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut out = vec![f64::NAN; n];
        if n < self.period + 1 {
            return out;
        }

        let p = self.period as f64;
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;

        for i in 1..n {
            let delta = bars[i].close - bars[i - 1].close;
            if delta.is_nan() {
                // A hole in the closes poisons every later value; whatever
                // was already written before the hole stands.
                return out;
            }
            let gain = delta.max(0.0);
            let loss = (-delta).max(0.0);

            if i <= self.period {
                // Seed phase: plain average of the first `period` changes.
                avg_gain += gain / p;
                avg_loss += loss / p;
                if i == self.period {
                    out[i] = rsi_value(avg_gain, avg_loss);
                }
            } else {
                avg_gain = (gain + (p - 1.0) * avg_gain) / p;
                avg_loss = (loss + (p - 1.0) * avg_loss) / p;
                out[i] = rsi_value(avg_gain, avg_loss);
            }
        }

        out
    }
}

/// RSI from the running averages. A flat series (both zero) pins to 50.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain == 0.0 && avg_loss == 0.0 {
        return 50.0;
    }
    100.0 * avg_gain / (avg_gain + avg_loss)
}
