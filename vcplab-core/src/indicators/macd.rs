//! Moving Average Convergence Divergence (MACD).
//!
//! Three outputs (separate Indicator instances):
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, signal_period), seeded after the line's warm-up
//! - Histogram: line - signal
//!
//! The signal advisor reads the (12, 26, 9) signal line's sign.
//! Lookback: slow - 1 for the line, slow + signal_period - 2 for the rest.

use crate::domain::Bar;
use crate::indicators::ema::{ema_from_first_valid, ema_of_series};
use crate::indicators::Indicator;

/// Which output of the MACD to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal_period: usize,
    output: MacdOutput,
    name: String,
}

impl Macd {
    pub fn line(fast: usize, slow: usize, signal_period: usize) -> Self {
        Self::build(fast, slow, signal_period, MacdOutput::Line, "macd")
    }

    pub fn signal(fast: usize, slow: usize, signal_period: usize) -> Self {
        Self::build(fast, slow, signal_period, MacdOutput::Signal, "macd_signal")
    }

    pub fn histogram(fast: usize, slow: usize, signal_period: usize) -> Self {
        Self::build(fast, slow, signal_period, MacdOutput::Histogram, "macd_hist")
    }

    fn build(
        fast: usize,
        slow: usize,
        signal_period: usize,
        output: MacdOutput,
        label: &str,
    ) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal_period >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow");
        Self {
            fast,
            slow,
            signal_period,
            output,
            name: format!("{label}_{fast}_{slow}_{signal_period}"),
        }
    }

    fn line_series(&self, closes: &[f64]) -> Vec<f64> {
        let fast_ema = ema_of_series(closes, self.fast);
        let slow_ema = ema_of_series(closes, self.slow);
        fast_ema
            .iter()
            .zip(&slow_ema)
            .map(|(f, s)| f - s)
            .collect()
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdOutput::Line => self.slow - 1,
            MacdOutput::Signal | MacdOutput::Histogram => self.slow + self.signal_period - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let line = self.line_series(&closes);
        match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal => ema_from_first_valid(&line, self.signal_period),
            MacdOutput::Histogram => {
                let signal = ema_from_first_valid(&line, self.signal_period);
                line.iter().zip(&signal).map(|(l, s)| l - s).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    // On a linear ramp each EMA settles at close minus a constant lag,
    // so the MACD line is exactly the difference of the two lags.
    #[test]
    fn macd_line_on_linear_ramp() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0]);
        let line = Macd::line(2, 4, 3).compute(&bars);

        for v in &line[..3] {
            assert!(v.is_nan());
        }
        // fast EMA lag = 0.5, slow EMA lag = 1.5, difference = 1.0
        for v in &line[3..] {
            assert_approx(*v, 1.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn macd_signal_seeds_after_line_warmup() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0]);
        let signal = Macd::signal(2, 4, 3).compute(&bars);

        // Line valid from index 3; signal seed lands at index 3 + 3 - 1 = 5.
        for v in &signal[..5] {
            assert!(v.is_nan());
        }
        for v in &signal[5..] {
            assert_approx(*v, 1.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0]);
        let line = Macd::line(2, 4, 3).compute(&bars);
        let signal = Macd::signal(2, 4, 3).compute(&bars);
        let hist = Macd::histogram(2, 4, 3).compute(&bars);

        for i in 5..8 {
            assert_approx(hist[i], line[i] - signal[i], DEFAULT_EPSILON);
        }
        assert!(hist[4].is_nan());
    }

    #[test]
    fn macd_too_few_bars_is_all_nan() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let signal = Macd::signal(2, 4, 3).compute(&bars);
        assert!(signal.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn macd_names_and_lookbacks() {
        assert_eq!(Macd::line(12, 26, 9).name(), "macd_12_26_9");
        assert_eq!(Macd::signal(12, 26, 9).name(), "macd_signal_12_26_9");
        assert_eq!(Macd::histogram(12, 26, 9).name(), "macd_hist_12_26_9");
        assert_eq!(Macd::line(12, 26, 9).lookback(), 25);
        assert_eq!(Macd::signal(12, 26, 9).lookback(), 33);
        assert_eq!(Macd::histogram(12, 26, 9).lookback(), 33);
    }
}
