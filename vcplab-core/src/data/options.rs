//! Options chain and fundamentals source.
//!
//! The options scorecard needs a thin slice of data per symbol: chain
//! activity for the nearest expiration, plus three statement-level
//! fundamentals. Both come from Yahoo's JSON endpoints (v7 options,
//! v10 quoteSummary). Requests are single-shot; a failed symbol is
//! skipped and the breaker keeps score.

use super::circuit_breaker::CircuitBreaker;
use super::provider::DataError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Chain activity for the nearest expiration, calls and puts combined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionsSnapshot {
    pub options_volume: u64,
    pub open_interest: u64,
    /// Mean implied volatility across contracts that report one.
    pub implied_volatility: Option<f64>,
}

/// Statement-level fundamentals, newest filing first.
///
/// Each field is `None` when the filing omits it; the scorecard awards
/// zero points for a missing metric rather than guessing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    /// Year-over-year total revenue growth as a fraction.
    pub revenue_growth: Option<f64>,
    /// Total debt over stockholder equity. `None` when equity is zero.
    pub debt_to_equity: Option<f64>,
    pub net_income: Option<f64>,
}

/// Options chain and fundamentals provider.
pub trait OptionsProvider: Send + Sync {
    fn name(&self) -> &str;

    fn snapshot(&self, symbol: &str) -> Result<OptionsSnapshot, DataError>;

    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, DataError>;
}

// ── Yahoo wire format ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChainEnvelope {
    #[serde(rename = "optionChain")]
    option_chain: ChainBody,
}

#[derive(Debug, Deserialize)]
struct ChainBody {
    result: Option<Vec<ChainResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChainResult {
    options: Vec<ExpirySlice>,
}

#[derive(Debug, Deserialize)]
struct ExpirySlice {
    calls: Vec<Contract>,
    puts: Vec<Contract>,
}

#[derive(Debug, Deserialize)]
struct Contract {
    volume: Option<u64>,
    #[serde(rename = "openInterest")]
    open_interest: Option<u64>,
    #[serde(rename = "impliedVolatility")]
    implied_volatility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryModules>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SummaryModules {
    #[serde(rename = "incomeStatementHistory")]
    income: Option<IncomeHistory>,
    #[serde(rename = "balanceSheetHistory")]
    balance: Option<BalanceHistory>,
}

#[derive(Debug, Deserialize)]
struct IncomeHistory {
    #[serde(rename = "incomeStatementHistory")]
    statements: Vec<IncomeStatement>,
}

#[derive(Debug, Deserialize)]
struct IncomeStatement {
    #[serde(rename = "totalRevenue")]
    total_revenue: Option<RawValue>,
    #[serde(rename = "netIncome")]
    net_income: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct BalanceHistory {
    #[serde(rename = "balanceSheetStatements")]
    statements: Vec<BalanceSheet>,
}

#[derive(Debug, Deserialize)]
struct BalanceSheet {
    #[serde(rename = "longTermDebt")]
    long_term_debt: Option<RawValue>,
    #[serde(rename = "shortLongTermDebt")]
    short_long_term_debt: Option<RawValue>,
    #[serde(rename = "totalStockholderEquity")]
    total_stockholder_equity: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Yahoo-backed options and fundamentals provider.
pub struct YahooOptionsProvider {
    client: reqwest::blocking::Client,
    breaker: Arc<CircuitBreaker>,
}

impl YahooOptionsProvider {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self { client, breaker }
    }

    fn options_url(symbol: &str) -> String {
        format!("https://query2.finance.yahoo.com/v7/finance/options/{symbol}")
    }

    fn summary_url(symbol: &str) -> String {
        format!(
            "https://query2.finance.yahoo.com/v10/finance/quoteSummary/{symbol}\
             ?modules=incomeStatementHistory,balanceSheetHistory"
        )
    }

    fn fetch_json<T: DeserializeOwned>(&self, url: &str, symbol: &str) -> Result<T, DataError> {
        if !self.breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let resp = self
            .client
            .get(url)
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
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DataError::AuthenticationRequired(
                "Yahoo Finance requires authentication".into(),
            ));
        }
        if !status.is_success() {
            self.breaker.record_failure();
            return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
        }

        let value = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;
        self.breaker.record_success();
        Ok(value)
    }

    /// Aggregate the nearest-expiration slice into a snapshot.
    fn snapshot_from_chain(
        symbol: &str,
        envelope: ChainEnvelope,
    ) -> Result<OptionsSnapshot, DataError> {
        let result = match envelope.option_chain.result {
            Some(result) => result,
            None => {
                return Err(match envelope.option_chain.error {
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

        let slice = result
            .into_iter()
            .next()
            .and_then(|r| r.options.into_iter().next())
            .ok_or_else(|| {
                DataError::ValidationError(format!("no listed options for {symbol}"))
            })?;

        let contracts = || slice.calls.iter().chain(slice.puts.iter());

        let options_volume = contracts().map(|c| c.volume.unwrap_or(0)).sum();
        let open_interest = contracts().map(|c| c.open_interest.unwrap_or(0)).sum();

        let ivs: Vec<f64> = contracts().filter_map(|c| c.implied_volatility).collect();
        let implied_volatility = if ivs.is_empty() {
            None
        } else {
            Some(ivs.iter().sum::<f64>() / ivs.len() as f64)
        };

        Ok(OptionsSnapshot {
            options_volume,
            open_interest,
            implied_volatility,
        })
    }

    fn fundamentals_from_summary(
        symbol: &str,
        envelope: SummaryEnvelope,
    ) -> Result<Fundamentals, DataError> {
        let result = match envelope.quote_summary.result {
            Some(result) => result,
            None => {
                return Err(match envelope.quote_summary.error {
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
        let modules = result.into_iter().next().ok_or_else(|| {
            DataError::ValidationError(format!("no fundamentals for {symbol}"))
        })?;

        let raw = |v: &Option<RawValue>| v.as_ref().and_then(|r| r.raw);

        let income = modules.income.as_ref().map(|h| h.statements.as_slice());
        let revenue_growth = income.and_then(|stmts| match stmts {
            [newest, prior, ..] => {
                let now = raw(&newest.total_revenue)?;
                let before = raw(&prior.total_revenue)?;
                (before != 0.0).then(|| (now - before) / before)
            }
            _ => None,
        });
        let net_income = income
            .and_then(|stmts| stmts.first())
            .and_then(|s| raw(&s.net_income));

        let debt_to_equity = modules
            .balance
            .as_ref()
            .and_then(|h| h.statements.first())
            .and_then(|sheet| {
                let long = raw(&sheet.long_term_debt);
                let short = raw(&sheet.short_long_term_debt);
                let debt = match (long, short) {
                    (None, None) => return None,
                    (l, s) => l.unwrap_or(0.0) + s.unwrap_or(0.0),
                };
                let equity = raw(&sheet.total_stockholder_equity)?;
                (equity != 0.0).then(|| debt / equity)
            });

        Ok(Fundamentals {
            revenue_growth,
            debt_to_equity,
            net_income,
        })
    }
}

impl OptionsProvider for YahooOptionsProvider {
    fn name(&self) -> &str {
        "yahoo_options"
    }

    fn snapshot(&self, symbol: &str) -> Result<OptionsSnapshot, DataError> {
        let envelope: ChainEnvelope = self.fetch_json(&Self::options_url(symbol), symbol)?;
        Self::snapshot_from_chain(symbol, envelope)
    }

    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, DataError> {
        let envelope: SummaryEnvelope = self.fetch_json(&Self::summary_url(symbol), symbol)?;
        Self::fundamentals_from_summary(symbol, envelope)
    }
}
