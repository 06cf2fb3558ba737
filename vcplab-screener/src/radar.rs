//! The radar list — JSONL persistence for screening hits.
//!
//! Every VCP candidate that clears the RS cutoff lands here, one JSON object
//! per line. The file is append-only and duplicate-safe: a (ticker, run_date)
//! key is written at most once, so a same-day rerun cannot double-count a
//! ticker. CSV export feeds spreadsheets and external watchlist tools.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcplab_core::pattern::ContractionStats;

/// A single radar entry: one ticker that passed the full screen on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub ticker: String,
    pub num_contractions: usize,
    pub max_contraction_pct: f64,
    pub min_contraction_pct: f64,
    pub weeks_of_contraction: f64,
    pub rs_rating: u32,
    pub run_date: NaiveDate,
    pub run_id: String,
}

impl ScreeningResult {
    /// Assemble an entry from pattern stats and run context.
    pub fn from_stats(
        ticker: &str,
        stats: &ContractionStats,
        rs_rating: u32,
        run_date: NaiveDate,
        run_id: &str,
    ) -> Self {
        Self {
            ticker: ticker.to_string(),
            num_contractions: stats.num_contractions,
            max_contraction_pct: stats.max_contraction_pct,
            min_contraction_pct: stats.min_contraction_pct,
            weeks_of_contraction: stats.weeks_of_contraction,
            rs_rating,
            run_date,
            run_id: run_id.to_string(),
        }
    }

    fn key(&self) -> (String, NaiveDate) {
        (self.ticker.clone(), self.run_date)
    }
}

/// Errors raised by the radar store.
#[derive(Debug, Error)]
pub enum RadarError {
    #[error("radar file error: {0}")]
    Io(#[from] io::Error),

    #[error("radar entry serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("radar CSV export: {0}")]
    Csv(#[from] csv::Error),

    #[error("radar CSV buffer: {0}")]
    CsvBuffer(String),
}

/// JSONL radar file manager.
///
/// Each line is an independent JSON object, making the format resilient to
/// partial writes and easy to stream. Appends skip keys already on file.
pub struct Radar {
    path: PathBuf,
}

impl Radar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry.
    ///
    /// Returns `Ok(true)` if written, `Ok(false)` if an entry with the same
    /// (ticker, run_date) key already exists.
    pub fn append(&self, entry: &ScreeningResult) -> Result<bool, RadarError> {
        Ok(self.append_all(std::slice::from_ref(entry))? == 1)
    }

    /// Append a batch, skipping keys already on file and duplicates within
    /// the batch itself. Returns how many entries were written.
    pub fn append_all(&self, entries: &[ScreeningResult]) -> Result<usize, RadarError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut keys: HashSet<(String, NaiveDate)> =
            self.read_all()?.iter().map(ScreeningResult::key).collect();

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut written = 0;
        for entry in entries {
            if !keys.insert(entry.key()) {
                continue;
            }
            let json = serde_json::to_string(entry)?;
            writeln!(file, "{json}")?;
            written += 1;
        }
        file.flush()?;

        Ok(written)
    }

    /// Read all entries from the radar file.
    ///
    /// Skips blank and malformed lines.
    pub fn read_all(&self) -> Result<Vec<ScreeningResult>, RadarError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)?;
        let reader = io::BufReader::new(file);
        let mut entries = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScreeningResult>(&line) {
                Ok(entry) => entries.push(entry),
                Err(_) => continue, // skip malformed lines
            }
        }

        Ok(entries)
    }

    /// Entries recorded on a specific run date.
    pub fn entries_for(&self, run_date: NaiveDate) -> Result<Vec<ScreeningResult>, RadarError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.run_date == run_date)
            .collect())
    }

    /// Get the current file size in bytes.
    pub fn file_size_bytes(&self) -> Result<u64, RadarError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Path to the radar file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Export radar entries as CSV.
///
/// Columns: ticker, run_date, rs_rating, num_contractions,
/// max_contraction_pct, min_contraction_pct, weeks_of_contraction, run_id
pub fn export_radar_csv(entries: &[ScreeningResult]) -> Result<String, RadarError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "ticker",
        "run_date",
        "rs_rating",
        "num_contractions",
        "max_contraction_pct",
        "min_contraction_pct",
        "weeks_of_contraction",
        "run_id",
    ])?;

    for e in entries {
        wtr.write_record([
            &e.ticker,
            &e.run_date.to_string(),
            &e.rs_rating.to_string(),
            &e.num_contractions.to_string(),
            &format!("{:.2}", e.max_contraction_pct),
            &format!("{:.2}", e.min_contraction_pct),
            &format!("{:.1}", e.weeks_of_contraction),
            &e.run_id,
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| RadarError::CsvBuffer(e.to_string()))?;
    String::from_utf8(data).map_err(|e| RadarError::CsvBuffer(e.to_string()))
}
