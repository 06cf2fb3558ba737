//! Four-rule vote advisor.
//!
//! Each rule votes +1 (bullish), -1 (bearish) or 0 on the latest bar:
//! - ma_cross: SMA7 above SMA25 with the low above EMA200, or the mirror
//! - band_rsi: close outside the (30, 2.0) Bollinger band with RSI past
//!   20/80
//! - macd_trend: sign of the MACD(12,26,9) signal line, gated by EMA200
//! - triple_supertrend: Supertrend (12,3), (11,2) and (10,1) all up, or
//!   any down, gated by EMA200
//!
//! A vote total of 2 or more is a Buy, 0 or less a Sell, 1 a Hold. The
//! series must extend past the longest warm-up so every rule has settled
//! values at the final bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::indicators::{Bollinger, Ema, Indicator, Macd, Rsi, Sma, Supertrend};

/// Bars to discard before trusting the vote columns. Covers the EMA200
/// seed plus a couple of bars of slack, like the upstream feeds trim.
pub const WARMUP_BARS: usize = 202;

/// Final call for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Buy => write!(f, "Buy"),
            Verdict::Sell => write!(f, "Sell"),
            Verdict::Hold => write!(f, "Hold"),
        }
    }
}

/// Per-rule votes on the final bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteBreakdown {
    pub ma_cross: i8,
    pub band_rsi: i8,
    pub macd_trend: i8,
    pub triple_supertrend: i8,
}

impl VoteBreakdown {
    pub fn total(&self) -> i8 {
        self.ma_cross + self.band_rsi + self.macd_trend + self.triple_supertrend
    }
}

/// Advisor output for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advice {
    pub symbol: String,
    pub date: NaiveDate,
    pub verdict: Verdict,
    pub votes: VoteBreakdown,
    pub close: f64,
}

pub(crate) fn verdict_from_total(total: i8) -> Verdict {
    if total >= 2 {
        Verdict::Buy
    } else if total <= 0 {
        Verdict::Sell
    } else {
        Verdict::Hold
    }
}

/// Evaluate the four rules on the series' final bar.
///
/// Returns None when the series is too short to clear the warm-up.
pub fn advise(series: &PriceSeries) -> Option<Advice> {
    if series.len() <= WARMUP_BARS {
        return None;
    }
    let bars = series.bars();
    let i = bars.len() - 1;
    let bar = &bars[i];

    let sma7 = Sma::new(7).compute(bars);
    let sma25 = Sma::new(25).compute(bars);
    let ema200 = Ema::new(200).compute(bars);
    let bb_upper = Bollinger::upper(30, 2.0).compute(bars);
    let bb_lower = Bollinger::lower(30, 2.0).compute(bars);
    let rsi = Rsi::new(14).compute(bars);
    let macd_signal = Macd::signal(12, 26, 9).compute(bars);
    let st_12_3 = Supertrend::new(12, 3.0).compute(bars);
    let st_11_2 = Supertrend::new(11, 2.0).compute(bars);
    let st_10_1 = Supertrend::new(10, 1.0).compute(bars);

    let above_long_ema = bar.low > ema200[i];
    let below_long_ema = bar.high < ema200[i];

    let ma_cross = if sma7[i] > sma25[i] && above_long_ema {
        1
    } else if sma7[i] < sma25[i] && below_long_ema {
        -1
    } else {
        0
    };

    let band_rsi = if bar.adj_close < bb_lower[i] && rsi[i] < 20.0 {
        1
    } else if bar.adj_close > bb_upper[i] && rsi[i] > 80.0 {
        -1
    } else {
        0
    };

    let macd_trend = if macd_signal[i] > 0.0 && above_long_ema {
        1
    } else if macd_signal[i] < 0.0 && below_long_ema {
        -1
    } else {
        0
    };

    // NaN supertrend values count as neither up nor down.
    let all_up = st_12_3[i] == 1.0 && st_11_2[i] == 1.0 && st_10_1[i] == 1.0;
    let any_down = st_12_3[i] == 0.0 || st_11_2[i] == 0.0 || st_10_1[i] == 0.0;
    let triple_supertrend = if all_up && above_long_ema {
        1
    } else if any_down && below_long_ema {
        -1
    } else {
        0
    };

    let votes = VoteBreakdown {
        ma_cross,
        band_rsi,
        macd_trend,
        triple_supertrend,
    };

    Some(Advice {
        symbol: bar.symbol.clone(),
        date: bar.date,
        verdict: verdict_from_total(votes.total()),
        votes,
        close: bar.close,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn ramp(n: usize, start: f64, step: f64) -> PriceSeries {
        let closes: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
        PriceSeries::from_bars(make_bars(&closes))
    }

    #[test]
    fn verdict_thresholds() {
        assert_eq!(verdict_from_total(4), Verdict::Buy);
        assert_eq!(verdict_from_total(2), Verdict::Buy);
        assert_eq!(verdict_from_total(1), Verdict::Hold);
        assert_eq!(verdict_from_total(0), Verdict::Sell);
        assert_eq!(verdict_from_total(-3), Verdict::Sell);
    }

    #[test]
    fn strong_uptrend_is_a_buy() {
        let series = ramp(250, 100.0, 1.0);
        let advice = advise(&series).unwrap();

        assert_eq!(advice.votes.ma_cross, 1);
        assert_eq!(advice.votes.macd_trend, 1);
        assert_eq!(advice.votes.triple_supertrend, 1);
        assert_eq!(advice.verdict, Verdict::Buy);
    }

    #[test]
    fn steady_decline_is_a_sell() {
        let series = ramp(250, 400.0, -1.0);
        let advice = advise(&series).unwrap();

        assert_eq!(advice.votes.ma_cross, -1);
        assert_eq!(advice.votes.macd_trend, -1);
        assert_eq!(advice.votes.triple_supertrend, -1);
        assert_eq!(advice.verdict, Verdict::Sell);
    }

    #[test]
    fn short_history_yields_nothing() {
        let series = ramp(WARMUP_BARS, 100.0, 1.0);
        assert!(advise(&series).is_none());
    }

    #[test]
    fn advice_reports_final_bar() {
        let series = ramp(250, 100.0, 1.0);
        let advice = advise(&series).unwrap();
        let last = series.last().unwrap();
        assert_eq!(advice.date, last.date);
        assert_eq!(advice.close, last.close);
        assert_eq!(advice.symbol, "TEST");
    }
}
