//! Serializable screener configuration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcplab_core::pattern::VcpCriteria;

/// Unique identifier for a screening run (content-addressable hash).
pub type RunId = String;

/// Errors raised while loading or validating a screener config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for the daily screen.
///
/// Every section has defaults, so an empty TOML file is a valid config.
/// The struct captures all parameters that affect screening output:
/// - Contraction criteria (bounds for the VCP flags)
/// - RS rating cutoff for radar admission
/// - Benchmark symbol and history depth
/// - Options scorecard thresholds
///
/// Paths and worker counts are operational knobs; they are excluded from
/// the run fingerprint because they cannot change what a run produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenerConfig {
    /// File and directory locations
    pub paths: PathsConfig,

    /// Market data settings
    pub data: DataConfig,

    /// Contraction-pattern acceptance bounds
    pub criteria: VcpCriteria,

    /// Minimum RS rating (0..=100) for a VCP candidate to reach the radar
    pub rs_min: u32,

    /// Options scorecard thresholds
    pub options: OptionsConfig,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            data: DataConfig::default(),
            criteria: VcpCriteria::default(),
            rs_min: 70,
            options: OptionsConfig::default(),
        }
    }
}

/// File and directory locations for screener artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Parquet price cache directory
    pub cache_dir: PathBuf,

    /// Radar list JSONL file
    pub radar_path: PathBuf,

    /// Day-keyed run snapshot directory
    pub snapshot_dir: PathBuf,

    /// Options scorecard journal JSONL file
    pub options_journal_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data/cache"),
            radar_path: PathBuf::from("data/radar.jsonl"),
            snapshot_dir: PathBuf::from("data/snapshots"),
            options_journal_path: PathBuf::from("data/options.jsonl"),
        }
    }
}

/// Market data settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Benchmark symbol for RS line computation
    pub benchmark: String,

    /// Years of daily history fetched per ticker
    pub history_years: u32,

    /// Finviz Elite auth token (None disables the Finviz universe provider)
    pub finviz_auth: Option<String>,

    /// Worker cap for the screening pass (1 = sequential)
    pub workers: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            benchmark: "^GSPC".to_string(),
            history_years: 2,
            finviz_auth: None,
            workers: 1,
        }
    }
}

/// Thresholds for the options scorecard.
///
/// Criteria with a sign test (revenue growth, net income) are fixed at zero
/// and not configurable; everything with a market-dependent magnitude is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptionsConfig {
    /// Worker cap for scorecard batch scoring
    pub workers: usize,

    /// Max distance from SMA50 (percent) for a Call/Put decision; beyond it, Hold
    pub price_distance_pct: f64,

    /// Minimum total option contract volume
    pub options_volume_floor: u64,

    /// Minimum total open interest
    pub open_interest_floor: u64,

    /// Minimum average daily share volume
    pub avg_volume_floor: f64,

    /// Minimum annualized historical volatility
    pub hv_floor: f64,

    /// Minimum implied volatility
    pub iv_floor: f64,

    /// Maximum debt-to-equity ratio
    pub max_debt_to_equity: f64,

    /// RSI(14) must be below this to count as not-overbought
    pub rsi_ceiling: f64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            price_distance_pct: 2.0,
            options_volume_floor: 10_000,
            open_interest_floor: 10_000,
            avg_volume_floor: 1_000_000.0,
            hv_floor: 0.3,
            iv_floor: 0.3,
            max_debt_to_equity: 1.0,
            rsi_ceiling: 70.0,
        }
    }
}

/// The subset of config that determines screening output, plus the run date.
///
/// Hashed to produce the RunId. Paths and worker counts are deliberately
/// absent: reruns with a different cache directory or thread count must
/// map to the same run.
#[derive(Serialize)]
struct RunFingerprint<'a> {
    run_date: NaiveDate,
    benchmark: &'a str,
    history_years: u32,
    criteria: &'a VcpCriteria,
    rs_min: u32,
}

impl ScreenerConfig {
    /// Load a config from a TOML file and validate it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Parse a config from TOML text and validate it.
    ///
    /// Absent keys fall back to defaults, so partial configs are fine.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Computes a deterministic hash ID for a run of this configuration.
    ///
    /// Two runs on the same date with identical screening parameters share a
    /// RunId; radar entries carry it so results stay traceable to the exact
    /// criteria that produced them.
    pub fn run_id(&self, run_date: NaiveDate) -> RunId {
        let fingerprint = RunFingerprint {
            run_date,
            benchmark: &self.data.benchmark,
            history_years: self.data.history_years,
            criteria: &self.criteria,
            rs_min: self.rs_min,
        };
        let json =
            serde_json::to_string(&fingerprint).expect("run fingerprint serialization failed");
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }

    /// Reject configurations that cannot produce a meaningful screen.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.criteria;
        if c.min_contractions == 0 {
            return Err(ConfigError::Invalid(
                "criteria.min_contractions must be at least 1".to_string(),
            ));
        }
        if c.min_contractions > c.max_contractions {
            return Err(ConfigError::Invalid(format!(
                "criteria.min_contractions ({}) exceeds criteria.max_contractions ({})",
                c.min_contractions, c.max_contractions
            )));
        }
        if c.max_depth_pct <= 0.0 || c.final_depth_pct <= 0.0 {
            return Err(ConfigError::Invalid(
                "criteria depth bounds must be positive".to_string(),
            ));
        }
        if c.final_depth_pct > c.max_depth_pct {
            return Err(ConfigError::Invalid(format!(
                "criteria.final_depth_pct ({}) exceeds criteria.max_depth_pct ({})",
                c.final_depth_pct, c.max_depth_pct
            )));
        }
        if c.min_weeks < 0.0 {
            return Err(ConfigError::Invalid(
                "criteria.min_weeks must not be negative".to_string(),
            ));
        }
        if self.rs_min > 100 {
            return Err(ConfigError::Invalid(format!(
                "rs_min ({}) must be within 0..=100",
                self.rs_min
            )));
        }
        if self.data.benchmark.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "data.benchmark must not be empty".to_string(),
            ));
        }
        if self.data.history_years == 0 {
            return Err(ConfigError::Invalid(
                "data.history_years must be at least 1".to_string(),
            ));
        }
        if self.data.workers == 0 || self.options.workers == 0 {
            return Err(ConfigError::Invalid(
                "worker counts must be at least 1".to_string(),
            ));
        }
        if self.options.price_distance_pct < 0.0 {
            return Err(ConfigError::Invalid(
                "options.price_distance_pct must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
