//! VcpLab CLI — screening, advice, and data commands.
//!
//! Commands:
//! - `screen` — run the daily VCP screen over the liquid universe
//! - `analyze` — check one cached symbol against the trend template and VCP criteria
//! - `advise` — composite Buy/Sell/Hold advice for one cached symbol
//! - `options` — score tickers on the options scorecard
//! - `download` — fetch daily history from Yahoo Finance and cache as Parquet
//! - `cache status` — report cached symbols, date ranges, sizes

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vcplab_core::calendar::is_trading_day;
use vcplab_core::data::{
    download_symbols, CircuitBreaker, FinvizScreener, ParquetCache, StdoutProgress, Watchlist,
    YahooDailyProvider, YahooOptionsProvider,
};
use vcplab_core::domain::PriceSeries;
use vcplab_core::indicators::{Atr, AvgVolume, Indicator, IndicatorSet, Rsi, Sma};
use vcplab_core::signals::WARMUP_BARS;
use vcplab_core::trend::evaluate;
use vcplab_screener::{
    analyze_ticker, export_radar_csv, run_screen, score_universe, AdviceBook, OptionsJournal,
    Radar, Scorecard, ScreenerConfig,
};

#[derive(Parser)]
#[command(
    name = "vcplab",
    about = "VcpLab CLI — VCP stock screening and options scoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daily VCP screen over the liquid universe.
    Screen {
        /// Path to a TOML screener config. Omitted sections use defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Screen even when the market is closed today.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Write the full radar history to a CSV file after the run.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Check one cached symbol against the trend template and VCP criteria.
    Analyze {
        /// Symbol to analyze (download it first).
        symbol: String,

        /// Path to a TOML screener config. Omitted sections use defaults.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Composite Buy/Sell/Hold advice for one cached symbol.
    Advise {
        /// Symbol to advise on (download it first).
        symbol: String,

        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,

        /// Advice journal path.
        #[arg(long, default_value = "data/advice.jsonl")]
        advice_path: PathBuf,
    },
    /// Score tickers on the options scorecard and journal the reports.
    Options {
        /// Tickers to score. Defaults to today's radar entries.
        tickers: Vec<String>,

        /// Path to a TOML screener config. Omitted sections use defaults.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Download daily history from Yahoo Finance and cache as Parquet.
    Download {
        /// Symbols to download (e.g., SPY QQQ AAPL).
        symbols: Vec<String>,

        /// Download every ticker in a watchlist TOML file instead.
        #[arg(long)]
        watchlist: Option<PathBuf>,

        /// Start date (YYYY-MM-DD). Defaults to 2 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Force re-download even if cached fresh today.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached symbols, date ranges, and sizes.
    Status {
        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Screen {
            config,
            force,
            export,
        } => run_screen_cmd(config, force, export),
        Commands::Analyze { symbol, config } => run_analyze(symbol, config),
        Commands::Advise {
            symbol,
            cache_dir,
            advice_path,
        } => run_advise(symbol, cache_dir, advice_path),
        Commands::Options { tickers, config } => run_options(tickers, config),
        Commands::Download {
            symbols,
            watchlist,
            start,
            end,
            force,
            cache_dir,
        } => run_download(symbols, watchlist, start, end, force, cache_dir),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
        },
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScreenerConfig> {
    match path {
        Some(p) => Ok(ScreenerConfig::from_file(p)?),
        None => Ok(ScreenerConfig::default()),
    }
}

fn run_screen_cmd(
    config_path: Option<PathBuf>,
    force: bool,
    export: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let today = chrono::Local::now().date_naive();

    if !is_trading_day(today) && !force {
        println!("{today} is not a trading day. Pass --force to screen anyway.");
        return Ok(());
    }

    let breaker = Arc::new(CircuitBreaker::for_provider());
    let prices = YahooDailyProvider::new(Arc::clone(&breaker));
    let universe = FinvizScreener::new(breaker, config.data.finviz_auth.clone());
    let cache = ParquetCache::new(&config.paths.cache_dir);

    let summary = run_screen(&config, &prices, &universe, &cache, today)?;

    println!();
    println!("=== Screen {} ===", summary.run_date);
    println!("Run id:       {}", summary.run_id);
    println!("Scanned:      {}", summary.scanned);
    println!("Skipped:      {}", summary.skipped);
    println!("Candidates:   {}", summary.results.len());
    println!("New on radar: {}", summary.appended);

    if !summary.results.is_empty() {
        println!();
        println!(
            "{:<8} {:>4} {:>5} {:>7} {:>7} {:>6}",
            "Ticker", "RS", "Legs", "Max%", "Final%", "Weeks"
        );
        println!("{}", "-".repeat(42));
        for hit in &summary.results {
            println!(
                "{:<8} {:>4} {:>5} {:>7.2} {:>7.2} {:>6.1}",
                hit.ticker,
                hit.rs_rating,
                hit.num_contractions,
                hit.max_contraction_pct,
                hit.min_contraction_pct,
                hit.weeks_of_contraction
            );
        }
    }

    if let Some(path) = export {
        let radar = Radar::new(&config.paths.radar_path);
        let entries = radar.read_all()?;
        let csv_text = export_radar_csv(&entries)?;
        std::fs::write(&path, csv_text)?;
        println!();
        println!("Exported {} radar entries to {}", entries.len(), path.display());
    }

    Ok(())
}

fn run_analyze(symbol: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let cache = ParquetCache::new(&config.paths.cache_dir);

    let series = PriceSeries::from_bars(cache.load(&symbol)?);
    let benchmark = PriceSeries::from_bars(cache.load(&config.data.benchmark)?);

    let Some(last) = series.last() else {
        println!("{symbol}: no bars cached.");
        return Ok(());
    };

    let analysis = analyze_ticker(&series, &benchmark, &config.criteria);
    let flags = evaluate(&series, &benchmark);

    println!();
    println!("=== {symbol} ===");
    println!(
        "History:          {} to {} ({} bars)",
        series.first_date().unwrap_or(last.date),
        series.last_date().unwrap_or(last.date),
        series.len()
    );
    println!("Last close:       {:.2}", last.close);

    let library: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(50)),
        Box::new(Sma::new(150)),
        Box::new(Sma::new(200)),
        Box::new(Rsi::new(14)),
        Box::new(Atr::new(14)),
        Box::new(AvgVolume::new(30)),
    ];
    let mut set = IndicatorSet::new();
    for indicator in &library {
        set.add(indicator.as_ref(), series.bars());
    }

    println!();
    println!("--- Indicators (last bar) ---");
    for indicator in &library {
        let shown = match set.get(indicator.name(), series.len() - 1) {
            Some(v) if !v.is_nan() => format!("{v:.2}"),
            _ => "warming up".to_string(),
        };
        println!("{:<18}{shown}", format!("{}:", indicator.name()));
    }

    if let Some(f) = flags.last() {
        println!();
        println!("--- Trend template (last bar) ---");
        println!("Above MA50:       {}", yes_no(f.above_ma50));
        println!("Above MA150:      {}", yes_no(f.above_ma150));
        println!("Above MA200:      {}", yes_no(f.above_ma200));
        println!("MA150 > MA200:    {}", yes_no(f.ma150_above_ma200));
        println!("MA50 > MA150:     {}", yes_no(f.ma50_above_ma150));
        println!("MA200 rising:     {}", yes_no(f.ma200_rising));
        println!("Above low floor:  {}", yes_no(f.above_low_floor));
        println!("Near 52w high:    {}", yes_no(f.near_high));
        println!("RS line rising:   {}", yes_no(f.rs_line_rising));
        println!("Stage 2:          {}", yes_no(analysis.stage2));
    }

    println!();
    println!("--- Contraction pattern ---");
    match analysis.vcp {
        Some(reading) => {
            println!("Contractions:     {}", reading.stats.num_contractions);
            println!("Max depth:        {:.2}%", reading.stats.max_contraction_pct);
            println!("Final depth:      {:.2}%", reading.stats.min_contraction_pct);
            println!("Duration:         {:.1} weeks", reading.stats.weeks_of_contraction);
            println!("Volume dry-up:    {}", yes_no(reading.flags.volume_dry_up));
            println!("Below pivot:      {}", yes_no(reading.flags.below_pivot));
            println!("VCP:              {}", yes_no(reading.flags.all()));
        }
        None if analysis.stage2 => println!("No measurable contractions."),
        None => println!("Not Stage 2; contraction analysis skipped."),
    }

    Ok(())
}

fn run_advise(symbol: String, cache_dir: PathBuf, advice_path: PathBuf) -> Result<()> {
    let cache = ParquetCache::new(cache_dir);
    let series = PriceSeries::from_bars(cache.load(&symbol)?);

    let book = AdviceBook::new(advice_path);
    match book.advise(&series)? {
        Some(advice) => {
            println!();
            println!("=== {} {} ===", advice.symbol, advice.date);
            println!("Verdict:           {}", advice.verdict);
            println!("Close:             {:.2}", advice.close);
            println!();
            println!("--- Component votes ---");
            println!("MA cross:          {:+}", advice.votes.ma_cross);
            println!("Bollinger + RSI:   {:+}", advice.votes.band_rsi);
            println!("MACD trend:        {:+}", advice.votes.macd_trend);
            println!("Triple supertrend: {:+}", advice.votes.triple_supertrend);
            println!("Total:             {:+}", advice.votes.total());
        }
        None => println!(
            "{symbol}: not enough history for advice (need {} bars, have {})",
            WARMUP_BARS,
            series.len()
        ),
    }

    Ok(())
}

fn run_options(tickers: Vec<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let today = chrono::Local::now().date_naive();

    let tickers = if tickers.is_empty() {
        let radar = Radar::new(&config.paths.radar_path);
        let from_radar: Vec<String> = radar
            .entries_for(today)?
            .into_iter()
            .map(|e| e.ticker)
            .collect();
        if from_radar.is_empty() {
            bail!("no tickers given and no radar entries for {today}; run `screen` first or pass tickers");
        }
        from_radar
    } else {
        tickers
    };

    let breaker = Arc::new(CircuitBreaker::for_provider());
    let options = YahooOptionsProvider::new(Arc::clone(&breaker));
    let prices = YahooDailyProvider::new(breaker);
    let cache = ParquetCache::new(&config.paths.cache_dir);

    let batch = score_universe(&config, &tickers, &options, &prices, &cache, today);

    let journal = OptionsJournal::new(&config.paths.options_journal_path);
    let appended = journal.append_all(&batch.reports)?;

    if !batch.reports.is_empty() {
        println!();
        println!(
            "{:<8} {:>5} {:<8} {:>9} {:>9} {:>7}",
            "Ticker", "Score", "Decision", "Price", "SMA50", "Dist%"
        );
        println!("{}", "-".repeat(51));
        for report in &batch.reports {
            let score = format!("{}/{}", report.total_score, Scorecard::MAX);
            println!(
                "{:<8} {:>5} {:<8} {:>9.2} {:>9.2} {:>+7.2}",
                report.ticker,
                score,
                report.decision.to_string(),
                report.price,
                report.sma50,
                report.distance_pct
            );
        }
    }

    if !batch.skipped.is_empty() {
        println!();
        println!("Skipped {} ticker(s):", batch.skipped.len());
        for (ticker, err) in &batch.skipped {
            println!("  {ticker}: {err}");
        }
    }

    println!();
    println!(
        "Journaled {appended} report(s) to {}",
        config.paths.options_journal_path.display()
    );

    Ok(())
}

fn run_download(
    symbols: Vec<String>,
    watchlist: Option<PathBuf>,
    start: Option<String>,
    end: Option<String>,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    if symbols.is_empty() && watchlist.is_none() {
        bail!("pass symbols or --watchlist");
    }
    if !symbols.is_empty() && watchlist.is_some() {
        bail!("symbols and --watchlist are mutually exclusive");
    }

    let watchlist = watchlist.map(|p| Watchlist::from_file(&p)).transpose()?;
    let sym_refs: Vec<&str> = match &watchlist {
        Some(w) => w.all_tickers(),
        None => symbols.iter().map(|s| s.as_str()).collect(),
    };

    let today = chrono::Local::now().date_naive();

    let start_date = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| today - chrono::Duration::days(365 * 2));

    let end_date = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or(today);

    let breaker = Arc::new(CircuitBreaker::for_provider());
    let provider = YahooDailyProvider::new(breaker);
    let cache = ParquetCache::new(cache_dir);
    let progress = StdoutProgress;

    let summary = download_symbols(
        &provider, &cache, &sym_refs, start_date, end_date, today, force, &progress,
    );

    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    let cache = ParquetCache::new(cache_dir);
    let symbols = cache.symbols();
    if symbols.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
    let statuses = cache.status(&sym_refs);

    let mut total_size: u64 = 0;

    println!("Cache: {}", cache_dir.display());
    println!("Symbols: {}", symbols.len());
    println!();
    println!(
        "{:<8} {:<25} {:<10} {:<12} {:>10}",
        "Symbol", "Date Range", "Bars", "Fetched", "Size"
    );
    println!("{}", "-".repeat(69));
    for status in &statuses {
        let range = match (status.start_date, status.end_date) {
            (Some(start), Some(end)) => format!("{start} to {end}"),
            _ => "(no meta)".into(),
        };
        let bars = status
            .bar_count
            .map_or_else(|| "-".into(), |n| format!("{n} bars"));
        let fetched = status
            .fetched_on
            .map_or_else(|| "-".into(), |d| d.to_string());
        let size = dir_size(&cache_dir.join(format!("symbol={}", status.symbol)));
        total_size += size;
        println!(
            "{:<8} {:<25} {:<10} {:<12} {:>10}",
            status.symbol,
            range,
            bars,
            fetched,
            format_size(size)
        );
    }
    println!();
    println!("Total size: {}", format_size(total_size));

    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    let mut size = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                size += meta.len();
            }
        }
    }
    size
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
