//! Contraction legs and their summary statistics.
//!
//! A leg is a local high followed by the next local low. Legs are paired
//! newest-first: a trailing high with no low after it is skipped, and a
//! leading low with no high before it never pairs. Depth is the percentage
//! drop from the high to the low, rounded to two decimals.
//!
//! The counted sequence is the leading run of strictly increasing depths in
//! newest-first order, which is exactly "each pullback shallower than the
//! one before it" in chronological order. No counted legs means there is no
//! contraction pattern to report.

use serde::{Deserialize, Serialize};

use crate::pattern::extrema::{ExtremaPoint, ExtremumKind};

/// One high-to-low pullback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub high_index: usize,
    pub low_index: usize,
    pub depth_pct: f64,
}

/// Summary of the counted contraction sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractionStats {
    /// Number of successively tighter legs, counted from the newest.
    pub num_contractions: usize,
    /// Depth of the oldest counted leg (the widest).
    pub max_contraction_pct: f64,
    /// Depth of the newest counted leg (the tightest).
    pub min_contraction_pct: f64,
    /// Trading weeks from the oldest counted high to the end of the series.
    pub weeks_of_contraction: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pair alternating extrema into legs, newest first.
pub fn contraction_legs(highs: &[f64], lows: &[f64], extrema: &[ExtremaPoint]) -> Vec<Leg> {
    let high_indices: Vec<usize> = extrema
        .iter()
        .filter(|p| p.kind == ExtremumKind::High)
        .map(|p| p.index)
        .collect();
    let low_indices: Vec<usize> = extrema
        .iter()
        .filter(|p| p.kind == ExtremumKind::Low)
        .map(|p| p.index)
        .collect();

    let mut legs = Vec::new();
    let mut hi = high_indices.len();
    let mut li = low_indices.len();
    while hi > 0 && li > 0 {
        let h = high_indices[hi - 1];
        let l = low_indices[li - 1];
        if l > h {
            let depth = (highs[h] - lows[l]) / highs[h] * 100.0;
            legs.push(Leg {
                high_index: h,
                low_index: l,
                depth_pct: round2(depth),
            });
            hi -= 1;
            li -= 1;
        } else {
            // This high has no low after it; try the next older one.
            hi -= 1;
        }
    }
    legs
}

/// Count the tightening run and summarize it. `bar_count` is the length of
/// the underlying series, used for the duration in weeks.
pub fn contraction_stats(legs: &[Leg], bar_count: usize) -> Option<ContractionStats> {
    let mut count = 0;
    for (k, leg) in legs.iter().enumerate() {
        let extends_run = if k == 0 {
            leg.depth_pct > 0.0
        } else {
            leg.depth_pct > legs[k - 1].depth_pct
        };
        if !extends_run {
            break;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }

    let oldest = &legs[count - 1];
    Some(ContractionStats {
        num_contractions: count,
        max_contraction_pct: oldest.depth_pct,
        min_contraction_pct: legs[0].depth_pct,
        weeks_of_contraction: (bar_count - oldest.high_index) as f64 / 5.0,
    })
}
