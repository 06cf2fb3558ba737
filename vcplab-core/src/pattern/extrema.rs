//! Local extrema detection.
//!
//! A point is a local maximum when it is strictly greater than every other
//! value within `order` positions on each side, with the window clipped at
//! the series edges. Endpoints never qualify: the first and last bar are
//! compared against themselves under clipping and strictness fails. Ties
//! and NaN neighbors also fail strictness, so plateaus produce no extrema.
//!
//! Maxima are detected on the high column and minima on the low column,
//! then merged into one strictly alternating sequence.

use serde::{Deserialize, Serialize};

/// Kind of turning point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtremumKind {
    High,
    Low,
}

/// A turning point in the price structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtremaPoint {
    pub index: usize,
    pub kind: ExtremumKind,
}

/// Indices that are strict local maxima of `values` within +/- `order`.
pub fn local_maxima(values: &[f64], order: usize) -> Vec<usize> {
    strict_extrema(values, order, |candidate, other| candidate > other)
}

/// Indices that are strict local minima of `values` within +/- `order`.
pub fn local_minima(values: &[f64], order: usize) -> Vec<usize> {
    strict_extrema(values, order, |candidate, other| candidate < other)
}

fn strict_extrema(values: &[f64], order: usize, beats: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let n = values.len();
    let mut out = Vec::new();
    if n < 3 {
        return out;
    }
    for i in 1..n - 1 {
        let lo = i.saturating_sub(order);
        let hi = (i + order).min(n - 1);
        let qualifies = (lo..=hi)
            .filter(|&j| j != i)
            .all(|j| beats(values[i], values[j]));
        if qualifies {
            out.push(i);
        }
    }
    out
}

/// Merge the high-column maxima and low-column minima into one strictly
/// alternating high/low sequence.
///
/// A bar that is both a maximum and a minimum is dropped entirely. Runs of
/// consecutive same-kind points collapse to the run's latest point, so the
/// result always alternates.
pub fn alternating_extrema(highs: &[f64], lows: &[f64], order: usize) -> Vec<ExtremaPoint> {
    let maxima = local_maxima(highs, order);
    let minima = local_minima(lows, order);

    // Chronological merge, discarding indices claimed by both kinds.
    let mut merged: Vec<ExtremaPoint> = Vec::with_capacity(maxima.len() + minima.len());
    let mut mi = 0;
    let mut ni = 0;
    while mi < maxima.len() && ni < minima.len() {
        if maxima[mi] == minima[ni] {
            mi += 1;
            ni += 1;
        } else if maxima[mi] < minima[ni] {
            merged.push(ExtremaPoint {
                index: maxima[mi],
                kind: ExtremumKind::High,
            });
            mi += 1;
        } else {
            merged.push(ExtremaPoint {
                index: minima[ni],
                kind: ExtremumKind::Low,
            });
            ni += 1;
        }
    }
    for &index in &maxima[mi..] {
        merged.push(ExtremaPoint {
            index,
            kind: ExtremumKind::High,
        });
    }
    for &index in &minima[ni..] {
        merged.push(ExtremaPoint {
            index,
            kind: ExtremumKind::Low,
        });
    }

    // Collapse same-kind runs to the latest point of each run.
    let mut out: Vec<ExtremaPoint> = Vec::with_capacity(merged.len());
    for point in merged {
        match out.last_mut() {
            Some(last) if last.kind == point.kind => *last = point,
            _ => out.push(point),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_peak_is_detected() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        assert_eq!(local_maxima(&values, 2), vec![4]);
        assert_eq!(local_minima(&values, 2), Vec::<usize>::new());
    }

    #[test]
    fn endpoints_never_qualify() {
        // Monotonic rise: the largest value sits at the last index, which
        // is excluded by definition.
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(local_maxima(&values, 1), Vec::<usize>::new());
        assert_eq!(local_minima(&values, 1), Vec::<usize>::new());
    }

    #[test]
    fn window_clips_at_edges() {
        // Peak at index 1 with order larger than its distance to the edge:
        // the window clips to [0, 4] and the peak still qualifies.
        let values = [1.0, 9.0, 2.0, 3.0, 4.0];
        assert_eq!(local_maxima(&values, 10), vec![1]);
    }

    #[test]
    fn plateau_peaks_are_rejected() {
        let values = [1.0, 3.0, 3.0, 1.0];
        assert_eq!(local_maxima(&values, 1), Vec::<usize>::new());
    }

    #[test]
    fn nan_neighbor_disqualifies() {
        let values = [1.0, 5.0, f64::NAN, 1.0, 0.5, 1.0];
        assert_eq!(local_maxima(&values, 1), Vec::<usize>::new());
        // The trough at 4 has a NaN outside its order-1 window, so it holds.
        assert_eq!(local_minima(&values, 1), vec![4]);
    }

    #[test]
    fn zigzag_alternates() {
        let highs = [1.0, 5.0, 1.5, 6.0, 2.0, 7.0, 2.5];
        let lows = [0.5, 4.0, 1.0, 5.0, 1.4, 6.0, 2.0];
        let extrema = alternating_extrema(&highs, &lows, 1);

        assert!(!extrema.is_empty());
        for pair in extrema.windows(2) {
            assert_ne!(pair[0].kind, pair[1].kind, "kinds must alternate");
            assert!(pair[0].index < pair[1].index);
        }
    }

    #[test]
    fn both_kind_index_is_dropped() {
        // Bar 1 is simultaneously a high-column maximum and a low-column
        // minimum (wide-range bar); it must not appear at all.
        let highs = [10.0, 20.0, 10.0];
        let lows = [5.0, 1.0, 5.0];
        let extrema = alternating_extrema(&highs, &lows, 1);
        assert!(extrema.is_empty());
    }

    #[test]
    fn same_kind_run_keeps_latest() {
        // Two maxima (indices 1 and 3) precede the only minimum (index 5):
        // the run of highs collapses to index 3.
        let highs = [1.0, 5.0, 1.0, 6.0, 1.0, 0.4, 1.0];
        let lows = [8.5, 8.6, 8.9, 9.0, 8.9, 0.2, 9.0];
        let extrema = alternating_extrema(&highs, &lows, 1);

        assert_eq!(
            extrema,
            vec![
                ExtremaPoint {
                    index: 3,
                    kind: ExtremumKind::High
                },
                ExtremaPoint {
                    index: 5,
                    kind: ExtremumKind::Low
                },
            ]
        );
    }

    #[test]
    fn short_series_has_no_extrema() {
        assert!(local_maxima(&[1.0, 2.0], 1).is_empty());
        assert!(alternating_extrema(&[1.0], &[1.0], 10).is_empty());
    }
}
