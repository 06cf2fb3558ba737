//! Yahoo Finance daily bar provider.
//!
//! Fetches OHLCV history from the v8 chart API with retry, exponential
//! backoff, and the shared circuit breaker. Yahoo has no official API and
//! changes the format without notice; parse failures surface as
//! `ResponseFormatChanged` so the caller can tell a moved endpoint from a
//! bad symbol.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, FetchResult, PriceProvider};
use crate::domain::Bar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartSeries>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartSeries {
    timestamp: Option<Vec<i64>>,
    indicators: SeriesIndicators,
}

#[derive(Debug, Deserialize)]
struct SeriesIndicators {
    quote: Vec<QuoteColumns>,
    adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    adjclose: Vec<Option<f64>>,
}

/// Daily bar provider backed by Yahoo's v8 chart endpoint.
pub struct YahooDailyProvider {
    client: reqwest::blocking::Client,
    breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooDailyProvider {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let end_ts = end.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true"
        )
    }

    /// Turn a chart payload into bars, oldest first.
    ///
    /// Rows where every quote column is null are non-trading days and get
    /// dropped silently. Rows that fail `Bar::is_well_formed` (partial
    /// nulls, inverted ranges) are dropped and counted. A missing adjclose
    /// section falls back to the raw close.
    fn parse_chart(symbol: &str, envelope: ChartEnvelope) -> Result<Vec<Bar>, DataError> {
        let series = match envelope.chart.result {
            Some(result) => result
                .into_iter()
                .next()
                .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?,
            None => {
                return Err(match envelope.chart.error {
                    Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    },
                    Some(err) => DataError::ResponseFormatChanged(format!(
                        "{}: {}",
                        err.code, err.description
                    )),
                    None => DataError::ResponseFormatChanged("empty result with no error".into()),
                });
            }
        };

        let timestamps = series
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;
        let quote = series
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;
        let adj_closes = series
            .indicators
            .adjclose
            .and_then(|cols| cols.into_iter().next())
            .map(|col| col.adjclose);

        let pick = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();

        let mut bars = Vec::with_capacity(timestamps.len());
        let mut malformed = 0usize;
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = pick(&quote.open, i);
            let high = pick(&quote.high, i);
            let low = pick(&quote.low, i);
            let close = pick(&quote.close, i);
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes.as_ref().and_then(|col| pick(col, i));

            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            let bar = Bar {
                symbol: symbol.to_string(),
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
                adj_close: adj_close.or(close).unwrap_or(f64::NAN),
            };
            if !bar.is_well_formed() {
                malformed += 1;
                continue;
            }
            bars.push(bar);
        }

        if malformed > 0 {
            tracing::debug!(symbol, malformed, "dropped malformed rows");
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }

            if !self.breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            match status {
                reqwest::StatusCode::FORBIDDEN => {
                    // IP ban; go quiet for the full cooldown.
                    self.breaker.trip();
                    return Err(DataError::CircuitBreakerTripped);
                }
                reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    self.breaker.record_failure();
                    let retry_after = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(60);
                    last_error = Some(DataError::RateLimited {
                        retry_after_secs: retry_after,
                    });
                    continue;
                }
                reqwest::StatusCode::UNAUTHORIZED => {
                    return Err(DataError::AuthenticationRequired(
                        "Yahoo Finance requires authentication".into(),
                    ));
                }
                s if !s.is_success() => {
                    self.breaker.record_failure();
                    last_error = Some(DataError::Other(format!("HTTP {s} for {symbol}")));
                    continue;
                }
                _ => {}
            }

            let envelope: ChartEnvelope = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
            })?;

            let bars = Self::parse_chart(symbol, envelope)?;
            self.breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl PriceProvider for YahooDailyProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        if !self.breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }
        let bars = self.fetch_with_retry(symbol, start, end)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.breaker.is_allowed()
    }
}
