//! Minervini-style trend template.
//!
//! Nine conditions evaluated per bar; all nine must hold for the bar to
//! pass, and a symbol is in a stage-two uptrend when the final two bars
//! both pass. Comparisons against NaN (warm-up, missing benchmark dates)
//! are false, so an unclassifiable bar never passes.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, PriceSeries};
use crate::indicators::sma::rolling_mean;
use crate::indicators::{Indicator, RollingExtreme};
use crate::trend::slope::rolling_slope;

/// Trading days in 52 weeks, clamped to the series length when shorter.
pub const YEAR_WINDOW: usize = 260;
/// Window for the MA200 and RS-line slopes.
pub const SLOPE_WINDOW: usize = 20;
/// The low must sit at least 30% above the 52-week low.
pub const LOW_FLOOR_MULT: f64 = 1.3;
/// The high must be within 25% of the 52-week high.
pub const NEAR_HIGH_FRACTION: f64 = 0.75;

/// One bar's verdict on each template condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendFlags {
    pub above_ma50: bool,
    pub above_ma150: bool,
    pub above_ma200: bool,
    pub ma150_above_ma200: bool,
    pub ma50_above_ma150: bool,
    pub ma200_rising: bool,
    pub above_low_floor: bool,
    pub near_high: bool,
    pub rs_line_rising: bool,
}

impl TrendFlags {
    /// True when every condition holds.
    pub fn pass(&self) -> bool {
        self.above_ma50
            && self.above_ma150
            && self.above_ma200
            && self.ma150_above_ma200
            && self.ma50_above_ma150
            && self.ma200_rising
            && self.above_low_floor
            && self.near_high
            && self.rs_line_rising
    }
}

/// Relative strength line: close divided by the benchmark close on the same
/// date. Dates the benchmark did not trade yield NaN.
pub fn rs_line(series: &PriceSeries, benchmark: &PriceSeries) -> Vec<f64> {
    let bench = series.aligned_closes(benchmark);
    series
        .closes()
        .iter()
        .zip(&bench)
        .map(|(c, b)| c / b)
        .collect()
}

/// Precomputed series feeding the per-bar template conditions.
#[derive(Debug, Clone)]
pub struct TemplateInputs {
    ma50: Vec<f64>,
    ma150: Vec<f64>,
    ma200: Vec<f64>,
    year_low: Vec<f64>,
    year_high: Vec<f64>,
    ma200_slope: Vec<f64>,
    rs_slope: Vec<f64>,
}

impl TemplateInputs {
    pub fn compute(series: &PriceSeries, benchmark: &PriceSeries) -> Self {
        let n = series.len();
        if n == 0 {
            return Self {
                ma50: vec![],
                ma150: vec![],
                ma200: vec![],
                year_low: vec![],
                year_high: vec![],
                ma200_slope: vec![],
                rs_slope: vec![],
            };
        }

        let closes = series.closes();
        let ma50 = rolling_mean(&closes, 50);
        let ma150 = rolling_mean(&closes, 150);
        let ma200 = rolling_mean(&closes, 200);

        let window = YEAR_WINDOW.min(n);
        let year_low = RollingExtreme::lowest_low(window).compute(series.bars());
        let year_high = RollingExtreme::highest_high(window).compute(series.bars());

        let ma200_slope = rolling_slope(&ma200, SLOPE_WINDOW);
        let rs = rs_line(series, benchmark);
        let rs_slope = rolling_slope(&rs, SLOPE_WINDOW);

        Self {
            ma50,
            ma150,
            ma200,
            year_low,
            year_high,
            ma200_slope,
            rs_slope,
        }
    }

    /// Evaluate the nine conditions for `bars[i]`.
    pub fn flags_at(&self, bars: &[Bar], i: usize) -> TrendFlags {
        let bar = &bars[i];
        TrendFlags {
            above_ma50: bar.close > self.ma50[i],
            above_ma150: bar.close > self.ma150[i],
            above_ma200: bar.close > self.ma200[i],
            ma150_above_ma200: self.ma150[i] > self.ma200[i],
            ma50_above_ma150: self.ma50[i] > self.ma150[i],
            ma200_rising: self.ma200_slope[i] > 0.0,
            above_low_floor: bar.low > LOW_FLOOR_MULT * self.year_low[i],
            near_high: bar.high > NEAR_HIGH_FRACTION * self.year_high[i],
            rs_line_rising: self.rs_slope[i] > 0.0,
        }
    }
}

/// Per-bar template flags for a whole series.
pub fn evaluate(series: &PriceSeries, benchmark: &PriceSeries) -> Vec<TrendFlags> {
    let inputs = TemplateInputs::compute(series, benchmark);
    let bars = series.bars();
    (0..bars.len()).map(|i| inputs.flags_at(bars, i)).collect()
}

/// Stage-two confirmation: the final two bars both pass every condition.
pub fn is_stage2(flags: &[TrendFlags]) -> bool {
    match flags {
        [.., prev, last] => prev.pass() && last.pass(),
        _ => false,
    }
}
