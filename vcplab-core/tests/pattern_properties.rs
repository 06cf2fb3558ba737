//! Property tests for extrema detection and contraction analysis.
//!
//! Uses proptest to verify structural invariants over arbitrary price
//! paths:
//! 1. Reconciled extrema alternate strictly in kind with increasing indices
//! 2. Extrema never sit on series endpoints
//! 3. Contraction legs pair each swing high with a later swing low
//! 4. Counted statistics are internally ordered (max >= min > 0)

use chrono::NaiveDate;
use proptest::prelude::*;
use vcplab_core::domain::{Bar, PriceSeries};
use vcplab_core::pattern::{
    alternating_extrema, analyze_vcp, contraction_legs, contraction_stats, ExtremumKind,
    VcpCriteria,
};

/// Arbitrary high/low path: positive prices, low strictly under high.
fn arb_ohlc_path() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((20.0..120.0f64, 0.5..8.0f64), 30..120).prop_map(|rows| {
        rows.into_iter()
            .map(|(mid, spread)| (mid + spread, mid - spread))
            .unzip()
    })
}

proptest! {
    /// After run-collapsing and tie-dropping, kinds must alternate and
    /// indices must strictly increase.
    #[test]
    fn extrema_alternate_strictly(path in arb_ohlc_path()) {
        let (highs, lows) = path;
        let points = alternating_extrema(&highs, &lows, 3);

        for pair in points.windows(2) {
            prop_assert!(pair[0].index < pair[1].index);
            prop_assert_ne!(pair[0].kind, pair[1].kind);
        }
    }

    /// Endpoints have no complete comparison window, so no extremum may
    /// land on the first or last bar.
    #[test]
    fn extrema_avoid_endpoints(path in arb_ohlc_path()) {
        let (highs, lows) = path;
        let n = highs.len();
        let points = alternating_extrema(&highs, &lows, 3);

        for p in &points {
            prop_assert!(p.index >= 1);
            prop_assert!(p.index + 1 < n);
        }
    }

    /// Every leg runs from a swing high to a strictly later swing low, and
    /// its depth is bounded above by 100% on positive prices.
    #[test]
    fn legs_pair_highs_with_later_lows(path in arb_ohlc_path()) {
        let (highs, lows) = path;
        let extrema = alternating_extrema(&highs, &lows, 2);
        let legs = contraction_legs(&highs, &lows, &extrema);

        for leg in &legs {
            prop_assert!(leg.low_index > leg.high_index);
            prop_assert!(leg.depth_pct < 100.0);
        }
    }

    /// When a tightening run is counted, the statistics are ordered:
    /// the shallowest (most recent) leg is positive and no deeper than the
    /// widest, and the duration is positive.
    #[test]
    fn counted_stats_are_ordered(path in arb_ohlc_path()) {
        let (highs, lows) = path;
        let extrema = alternating_extrema(&highs, &lows, 2);
        let legs = contraction_legs(&highs, &lows, &extrema);

        if let Some(stats) = contraction_stats(&legs, highs.len()) {
            prop_assert!(stats.num_contractions >= 1);
            prop_assert!(stats.num_contractions <= legs.len());
            prop_assert!(stats.min_contraction_pct > 0.0);
            prop_assert!(stats.max_contraction_pct >= stats.min_contraction_pct);
            prop_assert!(stats.weeks_of_contraction > 0.0);
        }
    }

    /// Full analysis on arbitrary data either declines or reports flags
    /// consistent with its own statistics.
    #[test]
    fn vcp_flags_cohere_with_stats(path in arb_ohlc_path()) {
        let (highs, lows) = path;
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars: Vec<Bar> = highs
            .iter()
            .zip(lows.iter())
            .enumerate()
            .map(|(i, (&high, &low))| {
                let close = (high + low) / 2.0;
                Bar {
                    symbol: "TEST".to_string(),
                    date: base + chrono::Duration::days(i as i64),
                    open: close,
                    high,
                    low,
                    close,
                    volume: 1_000 + (i as u64 % 17) * 400,
                    adj_close: close,
                }
            })
            .collect();
        let series = PriceSeries::from_bars(bars);

        let criteria = VcpCriteria::default();
        if let Some(reading) = analyze_vcp(&series, &criteria) {
            prop_assert!(reading.stats.num_contractions >= 1);
            if reading.flags.contraction_count_ok {
                prop_assert!(
                    (criteria.min_contractions..=criteria.max_contractions)
                        .contains(&reading.stats.num_contractions)
                );
            }
            if reading.flags.max_depth_ok {
                prop_assert!(reading.stats.max_contraction_pct <= criteria.max_depth_pct);
            }
            if reading.flags.final_depth_ok {
                prop_assert!(reading.stats.min_contraction_pct <= criteria.final_depth_pct);
            }
            if reading.flags.duration_ok {
                prop_assert!(reading.stats.weeks_of_contraction >= criteria.min_weeks);
            }
        }
    }
}

#[test]
fn extremum_kinds_compare() {
    assert_eq!(ExtremumKind::High, ExtremumKind::High);
    assert_ne!(ExtremumKind::High, ExtremumKind::Low);
}
