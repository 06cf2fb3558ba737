//! VcpLab Screener — screening orchestration, radar persistence, option scorecards.
//!
//! This crate builds on `vcplab-core` to provide:
//! - TOML screener configuration with validation and content-addressed run IDs
//! - Day-keyed run snapshots (universe, RS ranking, benchmark history)
//! - The daily VCP screen: Stage 2 gate, contraction flags, RS cutoff, radar append
//! - Radar list persistence (JSONL, duplicate-safe) with CSV export
//! - Options scorecard scoring with Call/Put/Hold decisions
//! - Day-keyed advice cache for the rule-based advisor

pub mod advise;
pub mod config;
pub mod options;
pub mod radar;
pub mod screener;
pub mod snapshot;

pub use advise::AdviceBook;
pub use config::{
    ConfigError, DataConfig, OptionsConfig, PathsConfig, RunId, ScreenerConfig,
};
pub use options::{
    score_ticker, score_universe, OptionsDecision, OptionsJournal, OptionsReport, ScoreBatch,
    Scorecard, TickerInputs,
};
pub use radar::{export_radar_csv, Radar, RadarError, ScreeningResult};
pub use screener::{analyze_ticker, run_screen, ScreenError, ScreenSummary, TickerAnalysis};
pub use snapshot::{RunSnapshot, SnapshotStore};
