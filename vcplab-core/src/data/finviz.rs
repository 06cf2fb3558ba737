//! Finviz screener export provider.
//!
//! Two downloads drive a screening run. The liquid universe uses the
//! overview export with trend pre-filters: market cap small and larger,
//! average volume over 100K, price above $2, SMA200 below SMA50, price
//! above SMA50. The ranking list uses the performance export ordered by
//! 52-week performance, best first, and feeds the relative strength table.
//!
//! The CSV export endpoint takes an optional elite auth token. Requests
//! are not retried: Finviz bans quickly, so a failure counts against the
//! shared circuit breaker and the run moves on.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, UniverseProvider};
use std::sync::Arc;
use std::time::Duration;

/// Overview-export filters for the screening universe.
pub const UNIVERSE_FILTERS: &str =
    "cap_smallover,sh_avgvol_o100,sh_price_o2,ta_sma200_sb50,ta_sma50_pa";

/// How many tickers to keep from the universe export.
pub const UNIVERSE_ROWS: usize = 960;

/// How many tickers to keep from the performance export.
pub const RANKING_ROWS: usize = 3000;

pub struct FinvizScreener {
    client: reqwest::blocking::Client,
    breaker: Arc<CircuitBreaker>,
    auth_token: Option<String>,
}

impl FinvizScreener {
    pub fn new(breaker: Arc<CircuitBreaker>, auth_token: Option<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            breaker,
            auth_token,
        }
    }

    fn export_url(&self, view: u32, filters: Option<&str>, order: &str) -> String {
        let mut url = format!("https://finviz.com/export.ashx?v={view}&o={order}");
        if let Some(f) = filters {
            url.push_str(&format!("&f={f}&ft=4"));
        }
        if let Some(token) = &self.auth_token {
            url.push_str(&format!("&auth={token}"));
        }
        url
    }

    fn fetch_export(
        &self,
        view: u32,
        filters: Option<&str>,
        order: &str,
        limit: usize,
    ) -> Result<Vec<String>, DataError> {
        if !self.breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = self.export_url(view, filters, order);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            self.breaker.trip();
            return Err(DataError::CircuitBreakerTripped);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.breaker.record_failure();
            return Err(DataError::RateLimited {
                retry_after_secs: 60,
            });
        }
        if !status.is_success() {
            self.breaker.record_failure();
            return Err(DataError::Other(format!("HTTP {status} from finviz")));
        }

        let body = resp
            .text()
            .map_err(|e| DataError::ResponseFormatChanged(e.to_string()))?;
        let tickers = parse_tickers(&body, limit)?;
        self.breaker.record_success();
        Ok(tickers)
    }
}

impl UniverseProvider for FinvizScreener {
    fn name(&self) -> &str {
        "finviz"
    }

    fn liquid_universe(&self) -> Result<Vec<String>, DataError> {
        self.fetch_export(111, Some(UNIVERSE_FILTERS), "ticker", UNIVERSE_ROWS)
    }

    fn performance_order(&self) -> Result<Vec<String>, DataError> {
        self.fetch_export(141, None, "-perf52w", RANKING_ROWS)
    }
}

/// Pull the Ticker column out of an export CSV, keeping row order and
/// stopping at `limit` rows.
fn parse_tickers(csv_text: &str, limit: usize) -> Result<Vec<String>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DataError::ResponseFormatChanged(format!("export headers: {e}")))?;
    let ticker_col = headers
        .iter()
        .position(|h| h == "Ticker")
        .ok_or_else(|| DataError::ResponseFormatChanged("export has no Ticker column".into()))?;

    let mut tickers = Vec::new();
    for record in reader.records() {
        if tickers.len() >= limit {
            break;
        }
        let record =
            record.map_err(|e| DataError::ResponseFormatChanged(format!("export row: {e}")))?;
        if let Some(ticker) = record.get(ticker_col) {
            if !ticker.is_empty() {
                tickers.push(ticker.to_string());
            }
        }
    }

    Ok(tickers)
}
