//! Volatility contraction pattern (VCP) detection.
//!
//! Runs the extrema/contraction pipeline over a series and grades the
//! result against six criteria (bounds from `VcpCriteria`, defaults shown):
//! - between 2 and 4 counted contractions
//! - the widest counted leg is at most 50% deep
//! - the tightest (newest) leg is at most 15% deep
//! - the pattern spans at least 2 trading weeks
//! - 5-day average volume below the 30-day average on the last bar
//! - the last bar's high sits strictly below the most recent local high
//!
//! A series with no counted contractions yields no reading at all rather
//! than a reading with zeroed fields.

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::indicators::{AvgVolume, Indicator};
use crate::pattern::contraction::{contraction_legs, contraction_stats, ContractionStats};
use crate::pattern::extrema::{alternating_extrema, ExtremumKind};

/// Neighborhood half-width for extrema detection.
pub const EXTREMA_ORDER: usize = 10;
/// Volume dry-up windows, in trading days.
pub const VOLUME_SHORT_WINDOW: usize = 5;
pub const VOLUME_LONG_WINDOW: usize = 30;

/// Tunable bounds for the contraction criteria.
///
/// The historical threshold values differ between published variants of the
/// pattern, so they are configuration, not constants. `Default` carries the
/// common set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcpCriteria {
    /// Acceptable counted-contraction range, inclusive.
    pub min_contractions: usize,
    pub max_contractions: usize,
    /// Depth ceiling for the widest counted leg, in percent.
    pub max_depth_pct: f64,
    /// Depth ceiling for the newest counted leg, in percent.
    pub final_depth_pct: f64,
    /// Minimum pattern duration, in trading weeks.
    pub min_weeks: f64,
}

impl Default for VcpCriteria {
    fn default() -> Self {
        Self {
            min_contractions: 2,
            max_contractions: 4,
            max_depth_pct: 50.0,
            final_depth_pct: 15.0,
            min_weeks: 2.0,
        }
    }
}

/// Pass/fail on each VCP criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcpFlags {
    pub contraction_count_ok: bool,
    pub max_depth_ok: bool,
    pub final_depth_ok: bool,
    pub duration_ok: bool,
    pub volume_dry_up: bool,
    pub below_pivot: bool,
}

impl VcpFlags {
    /// True when every criterion holds.
    pub fn all(&self) -> bool {
        self.contraction_count_ok
            && self.max_depth_ok
            && self.final_depth_ok
            && self.duration_ok
            && self.volume_dry_up
            && self.below_pivot
    }
}

/// Contraction statistics plus the graded criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VcpReading {
    pub stats: ContractionStats,
    pub flags: VcpFlags,
}

/// Analyze a series for a volatility contraction pattern.
///
/// Returns None when the series has no counted contractions (no extrema,
/// no completed legs, or a newest leg with zero depth).
pub fn analyze_vcp(series: &PriceSeries, criteria: &VcpCriteria) -> Option<VcpReading> {
    let bars = series.bars();
    let highs = series.highs();
    let lows = series.lows();

    let extrema = alternating_extrema(&highs, &lows, EXTREMA_ORDER);
    let legs = contraction_legs(&highs, &lows, &extrema);
    let stats = contraction_stats(&legs, bars.len())?;

    let last = bars.len() - 1;
    let short_vol = AvgVolume::new(VOLUME_SHORT_WINDOW).compute(bars);
    let long_vol = AvgVolume::new(VOLUME_LONG_WINDOW).compute(bars);

    // NaN averages (short history) fail the comparison, as does a missing
    // most-recent high.
    let volume_dry_up = short_vol[last] < long_vol[last];
    let below_pivot = extrema
        .iter()
        .rev()
        .find(|p| p.kind == ExtremumKind::High)
        .map(|p| bars[last].high < highs[p.index])
        .unwrap_or(false);

    let flags = VcpFlags {
        contraction_count_ok: (criteria.min_contractions..=criteria.max_contractions)
            .contains(&stats.num_contractions),
        max_depth_ok: stats.max_contraction_pct <= criteria.max_depth_pct,
        final_depth_ok: stats.min_contraction_pct <= criteria.final_depth_pct,
        duration_ok: stats.weeks_of_contraction >= criteria.min_weeks,
        volume_dry_up,
        below_pivot,
    };

    Some(VcpReading { stats, flags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    /// Piecewise-linear path through (index, value) anchor points.
    fn interp_path(anchors: &[(usize, f64)], n: usize) -> Vec<f64> {
        let mut path = vec![anchors[0].1; n];
        for pair in anchors.windows(2) {
            let (i0, v0) = pair[0];
            let (i1, v1) = pair[1];
            for i in i0..=i1 {
                let t = (i - i0) as f64 / (i1 - i0) as f64;
                path[i] = v0 + t * (v1 - v0);
            }
        }
        let (last_i, last_v) = *anchors.last().unwrap();
        for v in path.iter_mut().skip(last_i) {
            *v = last_v;
        }
        path
    }

    fn bars_from_path(path: &[f64], volumes: &[u64]) -> PriceSeries {
        let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars: Vec<Bar> = path
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&p, &volume))| Bar {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open: p,
                high: p,
                low: p,
                close: p,
                volume,
                adj_close: p,
            })
            .collect();
        PriceSeries::from_bars(bars)
    }

    /// Three successively tighter pullbacks: 30%, 20%, 8%.
    fn tightening_anchors() -> Vec<(usize, f64)> {
        vec![
            (0, 80.0),
            (12, 100.0), // H1
            (24, 70.0),  // L1: (100-70)/100 = 30%
            (36, 95.0),  // H2
            (48, 76.0),  // L2: (95-76)/95 = 20%
            (58, 96.0),  // H3
            (66, 88.32), // L3: (96-88.32)/96 = 8%
            (70, 91.0),
        ]
    }

    fn drying_volumes(n: usize) -> Vec<u64> {
        let mut volumes = vec![2_000_000u64; n];
        for v in volumes.iter_mut().skip(n - 5) {
            *v = 400_000;
        }
        volumes
    }

    #[test]
    fn textbook_pattern_passes_all_flags() {
        let n = 71;
        let path = interp_path(&tightening_anchors(), n);
        let series = bars_from_path(&path, &drying_volumes(n));

        let reading = analyze_vcp(&series, &VcpCriteria::default()).unwrap();
        assert_eq!(reading.stats.num_contractions, 3);
        assert_eq!(reading.stats.max_contraction_pct, 30.0);
        assert_eq!(reading.stats.min_contraction_pct, 8.0);
        // Oldest counted high at index 12: (71 - 12) / 5 weeks.
        assert_eq!(reading.stats.weeks_of_contraction, 11.8);
        assert!(reading.flags.all(), "flags: {:?}", reading.flags);
    }

    #[test]
    fn monotonic_rise_has_no_reading() {
        let n = 60;
        let path = interp_path(&[(0, 50.0), (59, 150.0)], n);
        let series = bars_from_path(&path, &vec![1_000_000; n]);
        assert!(analyze_vcp(&series, &VcpCriteria::default()).is_none());
    }

    #[test]
    fn single_contraction_fails_count() {
        let n = 50;
        let path = interp_path(&[(0, 80.0), (15, 100.0), (30, 85.0), (49, 92.0)], n);
        let series = bars_from_path(&path, &drying_volumes(n));

        let reading = analyze_vcp(&series, &VcpCriteria::default()).unwrap();
        assert_eq!(reading.stats.num_contractions, 1);
        assert!(!reading.flags.contraction_count_ok);
        assert!(!reading.flags.all());
    }

    #[test]
    fn deep_base_fails_depth_ceiling() {
        let n = 71;
        let mut anchors = tightening_anchors();
        anchors[2] = (24, 40.0); // (100-40)/100 = 60% deep
        let path = interp_path(&anchors, n);
        let series = bars_from_path(&path, &drying_volumes(n));

        let reading = analyze_vcp(&series, &VcpCriteria::default()).unwrap();
        assert_eq!(reading.stats.max_contraction_pct, 60.0);
        assert!(!reading.flags.max_depth_ok);
        assert!(!reading.flags.all());
    }

    #[test]
    fn looser_criteria_accept_a_deeper_base() {
        let n = 71;
        let mut anchors = tightening_anchors();
        anchors[2] = (24, 40.0);
        let path = interp_path(&anchors, n);
        let series = bars_from_path(&path, &drying_volumes(n));

        let loose = VcpCriteria {
            max_depth_pct: 65.0,
            ..VcpCriteria::default()
        };
        let reading = analyze_vcp(&series, &loose).unwrap();
        assert!(reading.flags.max_depth_ok);
        assert!(reading.flags.all(), "flags: {:?}", reading.flags);
    }

    #[test]
    fn rising_volume_fails_dry_up() {
        let n = 71;
        let path = interp_path(&tightening_anchors(), n);
        let mut volumes = vec![500_000u64; n];
        for v in volumes.iter_mut().skip(n - 5) {
            *v = 5_000_000;
        }
        let series = bars_from_path(&path, &volumes);

        let reading = analyze_vcp(&series, &VcpCriteria::default()).unwrap();
        assert!(!reading.flags.volume_dry_up);
        assert!(!reading.flags.all());
    }

    #[test]
    fn close_above_pivot_fails_breakout_check() {
        let n = 71;
        let mut anchors = tightening_anchors();
        *anchors.last_mut().unwrap() = (70, 97.0); // ends above the 96 pivot
        let path = interp_path(&anchors, n);
        let series = bars_from_path(&path, &drying_volumes(n));

        let reading = analyze_vcp(&series, &VcpCriteria::default()).unwrap();
        assert!(!reading.flags.below_pivot);
        assert!(!reading.flags.all());
    }
}
