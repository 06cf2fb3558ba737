//! Synthetic bar generation for offline development.
//!
//! A deterministic random walk seeded from the symbol name, so the same
//! symbol always produces the same series. Bars land on trading days only.
//! Synthetic data is tagged through `DataSource::Synthetic` and never mixes
//! silently with real results.

use crate::calendar::is_trading_day;
use crate::domain::Bar;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate a daily random walk for `symbol` between `start` and `end`.
pub fn synthetic_daily_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if !is_trading_day(current) {
            current += Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            symbol: symbol.to_string(),
            date: current,
            open,
            high,
            low,
            close,
            volume,
            adj_close: close,
        });

        price = close;
        current += Duration::days(1);
    }

    bars
}
