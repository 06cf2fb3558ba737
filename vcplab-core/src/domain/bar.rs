//! Daily OHLCV bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of price history for a single symbol.
///
/// `adj_close` carries the split/dividend-adjusted close from the source
/// feed. Trend and contraction analysis read raw OHLC; the signal advisor
/// compares `adj_close` against its Bollinger bands, matching the feed it
/// was calibrated on. After a split the adjusted close can sit far outside
/// the day's raw range, so it is never range-checked against high/low.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adj_close: f64,
}

impl Bar {
    /// Whether the bar is usable: positive prices, open and close inside
    /// the day's range, no NaN anywhere. NaN fails every comparison, so a
    /// partially-null feed row is rejected without an explicit check.
    /// Zero volume is allowed (halted and thinly traded days are real).
    pub fn is_well_formed(&self) -> bool {
        let in_range = |p: f64| self.low <= p && p <= self.high;
        in_range(self.open) && in_range(self.close) && self.low > 0.0 && self.adj_close > 0.0
    }
}
