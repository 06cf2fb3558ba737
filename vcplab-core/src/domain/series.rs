//! PriceSeries — an ordered daily history for one symbol.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Bar;

/// Daily bars for one symbol, sorted ascending by date with duplicates removed.
///
/// Construction normalizes whatever the source handed back: bars are keyed by
/// date and a later bar for the same date replaces the earlier one, so a
/// re-download of an overlapping range never produces a double-counted day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Builds a series from unordered bars. Sorts by date; on duplicate
    /// dates the last bar wins.
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
        for bar in bars {
            by_date.insert(bar.date, bar);
        }
        Self {
            bars: by_date.into_values().collect(),
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Close column.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// High column.
    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// Low column.
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// For each of this series' dates, the other series' close on that date,
    /// or NaN when the other series has no bar there. Used to divide a stock
    /// by its benchmark without assuming identical trading calendars.
    pub fn aligned_closes(&self, other: &PriceSeries) -> Vec<f64> {
        let other_by_date: BTreeMap<NaiveDate, f64> =
            other.bars.iter().map(|b| (b.date, b.close)).collect();
        self.bars
            .iter()
            .map(|b| other_by_date.get(&b.date).copied().unwrap_or(f64::NAN))
            .collect()
    }
}
