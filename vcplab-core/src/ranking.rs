//! Relative strength rating.
//!
//! The universe is ranked by 52-week performance, best first. A ticker's
//! rating is its percentile position in that order: the leader gets 100,
//! the tail approaches 0, and a ticker missing from the ranking gets 0.

use std::collections::HashMap;

/// Performance-ordered universe with percentile lookups.
#[derive(Debug, Clone, Default)]
pub struct RsTable {
    order: Vec<String>,
    index: HashMap<String, usize>,
}

impl RsTable {
    /// Build from tickers sorted best-performance-first. A ticker appearing
    /// more than once keeps its best (earliest) position.
    pub fn new(ordered: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(ordered.len());
        for (i, ticker) in ordered.iter().enumerate() {
            index.entry(ticker.clone()).or_insert(i);
        }
        Self {
            order: ordered,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn tickers(&self) -> &[String] {
        &self.order
    }

    /// Percentile rating in 0..=100. Unranked tickers rate 0.
    pub fn rating(&self, ticker: &str) -> u32 {
        match self.index.get(ticker) {
            Some(&idx) => {
                let total = self.order.len() as f64;
                (((total - idx as f64) / total) * 100.0).round() as u32
            }
            None => 0,
        }
    }
}
