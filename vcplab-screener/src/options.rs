//! Options scorecard — liquidity, volatility, and fundamentals criteria.
//!
//! Ten criteria with fixed point weights rate a ticker's suitability for an
//! options position (max 18 points). A separate decision leg compares price
//! to SMA50: within the configured distance, Call above / Put below;
//! otherwise Hold. Thresholds come from `OptionsConfig`; `score_ticker` is
//! pure so tests can feed crafted inputs. Batch scoring fans out on a
//! bounded rayon pool and journals every report as JSONL.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use vcplab_core::data::{
    DataError, Fundamentals, OptionsProvider, OptionsSnapshot, ParquetCache, PriceProvider,
};
use vcplab_core::domain::Bar;
use vcplab_core::indicators::{Indicator, Rsi, Sma};

use crate::config::{OptionsConfig, ScreenerConfig};
use crate::screener::fetch_or_cached;

/// Bars in roughly one trading year.
const YEAR_BARS: usize = 252;

/// Everything the scorecard reads for one ticker.
#[derive(Debug, Clone)]
pub struct TickerInputs {
    pub symbol: String,
    /// Nearest-expiration chain activity.
    pub snapshot: OptionsSnapshot,
    pub fundamentals: Fundamentals,
    /// About one year of daily bars, oldest first.
    pub history: Vec<Bar>,
}

/// One boolean per criterion; `true` earns that criterion's weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    /// Chain volume above the floor (1 point)
    pub options_volume: bool,
    /// Open interest above the floor (1 point)
    pub open_interest: bool,
    /// Average share volume above the floor (2 points)
    pub avg_volume: bool,
    /// Annualized historical volatility above the floor (1 point)
    pub historical_volatility: bool,
    /// Mean implied volatility above the floor (2 points)
    pub implied_volatility: bool,
    /// Year-over-year revenue growth positive (3 points)
    pub revenue_growth: bool,
    /// Debt-to-equity below the ceiling (2 points)
    pub debt_to_equity: bool,
    /// Latest net income positive (3 points)
    pub net_income: bool,
    /// SMA50 above SMA200 (2 points)
    pub sma_trend: bool,
    /// RSI(14) below the ceiling (1 point)
    pub not_overbought: bool,
}

impl Scorecard {
    /// Highest achievable total.
    pub const MAX: u32 = 18;

    /// Weighted total in 0..=MAX.
    pub fn total(&self) -> u32 {
        let mut score = 0;
        if self.options_volume {
            score += 1;
        }
        if self.open_interest {
            score += 1;
        }
        if self.avg_volume {
            score += 2;
        }
        if self.historical_volatility {
            score += 1;
        }
        if self.implied_volatility {
            score += 2;
        }
        if self.revenue_growth {
            score += 3;
        }
        if self.debt_to_equity {
            score += 2;
        }
        if self.net_income {
            score += 3;
        }
        if self.sma_trend {
            score += 2;
        }
        if self.not_overbought {
            score += 1;
        }
        score
    }
}

/// Direction leg of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionsDecision {
    Call,
    Put,
    Hold,
}

impl fmt::Display for OptionsDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptionsDecision::Call => "Call",
            OptionsDecision::Put => "Put",
            OptionsDecision::Hold => "Hold",
        };
        f.write_str(s)
    }
}

/// Scored report for one ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsReport {
    pub ticker: String,
    pub scorecard: Scorecard,
    pub total_score: u32,
    pub decision: OptionsDecision,
    /// Latest daily close.
    pub price: f64,
    pub sma50: f64,
    /// Signed percent distance of price from SMA50.
    pub distance_pct: f64,
    pub run_date: NaiveDate,
}

/// Score one ticker from assembled inputs.
///
/// Empty history or an unwarmed SMA50 is a validation error: the ticker is
/// skipped rather than partially scored. Absent optional metrics (implied
/// volatility, fundamentals fields) score zero for their criterion instead.
pub fn score_ticker(
    inputs: &TickerInputs,
    config: &OptionsConfig,
    run_date: NaiveDate,
) -> Result<OptionsReport, DataError> {
    let bars = &inputs.history;
    let last = bars
        .last()
        .ok_or_else(|| DataError::ValidationError(format!("{}: empty history", inputs.symbol)))?;
    let price = last.close;
    if !price.is_finite() || price <= 0.0 {
        return Err(DataError::ValidationError(format!(
            "{}: unusable last close {price}",
            inputs.symbol
        )));
    }

    let Some(sma50) = last_value(&Sma::new(50).compute(bars)) else {
        return Err(DataError::ValidationError(format!(
            "{}: history too short for SMA50",
            inputs.symbol
        )));
    };
    let sma200 = last_value(&Sma::new(200).compute(bars));
    let rsi14 = last_value(&Rsi::new(14).compute(bars));

    let hv = historical_volatility(bars);
    let avg_volume = mean_volume(bars);

    let snap = &inputs.snapshot;
    let funds = &inputs.fundamentals;
    let scorecard = Scorecard {
        options_volume: snap.options_volume > config.options_volume_floor,
        open_interest: snap.open_interest > config.open_interest_floor,
        avg_volume: avg_volume > config.avg_volume_floor,
        historical_volatility: hv > config.hv_floor,
        implied_volatility: snap.implied_volatility.is_some_and(|iv| iv > config.iv_floor),
        revenue_growth: funds.revenue_growth.is_some_and(|g| g > 0.0),
        debt_to_equity: funds
            .debt_to_equity
            .is_some_and(|d| d < config.max_debt_to_equity),
        net_income: funds.net_income.is_some_and(|n| n > 0.0),
        sma_trend: sma200.is_some_and(|s200| sma50 > s200),
        not_overbought: rsi14.is_some_and(|r| r < config.rsi_ceiling),
    };
    let total_score = scorecard.total();

    let distance_pct = (price - sma50) / sma50 * 100.0;
    let decision = if distance_pct.abs() <= config.price_distance_pct {
        if price > sma50 {
            OptionsDecision::Call
        } else {
            OptionsDecision::Put
        }
    } else {
        OptionsDecision::Hold
    };

    Ok(OptionsReport {
        ticker: inputs.symbol.clone(),
        scorecard,
        total_score,
        decision,
        price,
        sma50,
        distance_pct,
        run_date,
    })
}

/// Annualized historical volatility: sample standard deviation of simple
/// daily returns, scaled by √252.
pub fn historical_volatility(bars: &[Bar]) -> f64 {
    let returns: Vec<f64> = bars
        .windows(2)
        .filter(|w| {
            w[0].close.is_finite() && w[1].close.is_finite() && w[0].close != 0.0
        })
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt() * (252.0_f64).sqrt()
}

/// Last value of an indicator series, if it has warmed up.
fn last_value(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| v.is_finite())
}

fn mean_volume(bars: &[Bar]) -> f64 {
    if bars.is_empty() {
        return 0.0;
    }
    bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64
}

/// Batch outcome: reports plus the tickers that had to be skipped.
#[derive(Debug)]
pub struct ScoreBatch {
    pub reports: Vec<OptionsReport>,
    pub skipped: Vec<(String, DataError)>,
}

/// Score a list of tickers, fanning out on a bounded rayon pool.
///
/// One ticker's failure never cancels the others; failures are gathered
/// into `skipped` after every worker finishes. History comes through the
/// same fetch-or-cache path the screen uses, trimmed to the last year.
pub fn score_universe(
    config: &ScreenerConfig,
    tickers: &[String],
    options: &dyn OptionsProvider,
    prices: &dyn PriceProvider,
    cache: &ParquetCache,
    today: NaiveDate,
) -> ScoreBatch {
    // Build Rayon thread pool if the worker cap allows it
    let thread_pool = if config.options.workers > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.options.workers)
                .build()
                .expect("failed to build Rayon thread pool"),
        )
    } else {
        None
    };

    let outcomes: Vec<(String, Result<OptionsReport, DataError>)> =
        if let Some(ref tp) = thread_pool {
            tp.install(|| {
                tickers
                    .par_iter()
                    .map(|ticker| {
                        let result = score_one(ticker, config, options, prices, cache, today);
                        (ticker.clone(), result)
                    })
                    .collect()
            })
        } else {
            tickers
                .iter()
                .map(|ticker| {
                    let result = score_one(ticker, config, options, prices, cache, today);
                    (ticker.clone(), result)
                })
                .collect()
        };

    let mut reports = Vec::new();
    let mut skipped = Vec::new();
    for (ticker, outcome) in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::warn!(%ticker, error = %e, "skipping options score");
                skipped.push((ticker, e));
            }
        }
    }

    ScoreBatch { reports, skipped }
}

/// Assemble inputs for one ticker and score it.
fn score_one(
    ticker: &str,
    config: &ScreenerConfig,
    options: &dyn OptionsProvider,
    prices: &dyn PriceProvider,
    cache: &ParquetCache,
    today: NaiveDate,
) -> Result<OptionsReport, DataError> {
    let snapshot = options.snapshot(ticker)?;
    let fundamentals = options.fundamentals(ticker)?;
    let bars = fetch_or_cached(ticker, config, prices, cache, today)?;
    let start = bars.len().saturating_sub(YEAR_BARS);

    let inputs = TickerInputs {
        symbol: ticker.to_string(),
        snapshot,
        fundamentals,
        history: bars[start..].to_vec(),
    };
    score_ticker(&inputs, &config.options, today)
}

/// JSONL journal of scored reports.
///
/// Unlike the radar, every run's reports are appended as-is: the journal is
/// a log of what was recommended when, not a deduplicated result set.
pub struct OptionsJournal {
    path: PathBuf,
}

impl OptionsJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append a batch of reports, one JSON object per line.
    pub fn append_all(&self, reports: &[OptionsReport]) -> io::Result<usize> {
        if reports.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        for report in reports {
            let json = serde_json::to_string(report)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(file, "{json}")?;
        }
        file.flush()?;

        Ok(reports.len())
    }

    /// Read all journal entries, skipping blank and malformed lines.
    pub fn read_all(&self) -> io::Result<Vec<OptionsReport>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)?;
        let reader = io::BufReader::new(file);
        let mut reports = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<OptionsReport>(&line) {
                Ok(report) => reports.push(report),
                Err(_) => continue, // skip malformed lines
            }
        }

        Ok(reports)
    }

    /// Path to the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
