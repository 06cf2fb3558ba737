//! Day-keyed advice cache.
//!
//! The four-rule advisor is deterministic for a given series, so its output
//! is computed once per (symbol, day) and journaled as JSONL. Re-asking on
//! the same day answers from memory; a new `AdviceBook` on the same path
//! answers from the journal.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use vcplab_core::domain::PriceSeries;
use vcplab_core::signals::{advise, Advice};

/// Advice journal with an in-memory index keyed by (symbol, bar date).
///
/// One lock covers lookup, compute and append, so concurrent calls for the
/// same day write a single journal line.
pub struct AdviceBook {
    path: PathBuf,
    mem: std::sync::Mutex<HashMap<(String, NaiveDate), Advice>>,
}

impl AdviceBook {
    /// Open a book over the given journal path, loading any prior entries.
    /// An unreadable journal starts the book empty rather than failing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mem = match load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "starting with an empty advice book");
                HashMap::new()
            }
        };
        Self {
            path,
            mem: std::sync::Mutex::new(mem),
        }
    }

    /// Advice for the series' final bar, cached per (symbol, date).
    ///
    /// Returns Ok(None) when the series is empty or too short for the
    /// advisor's warm-up. A fresh verdict is journaled before it is
    /// returned; a failed append leaves the cache untouched so a retry
    /// recomputes and appends again.
    pub fn advise(&self, series: &PriceSeries) -> io::Result<Option<Advice>> {
        let Some(last) = series.last() else {
            return Ok(None);
        };
        let key = (last.symbol.clone(), last.date);

        let mut mem = self.mem.lock().unwrap();
        if let Some(cached) = mem.get(&key) {
            return Ok(Some(cached.clone()));
        }

        let Some(fresh) = advise(series) else {
            return Ok(None);
        };
        self.append_line(&fresh)?;
        mem.insert(key, fresh.clone());
        Ok(Some(fresh))
    }

    fn append_line(&self, advice: &Advice) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(advice)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(())
    }

    /// Path to the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_entries(path: &Path) -> io::Result<HashMap<(String, NaiveDate), Advice>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let mut entries = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Advice>(&line) {
            Ok(advice) => {
                entries.insert((advice.symbol.clone(), advice.date), advice);
            }
            Err(_) => continue, // skip malformed lines
        }
    }

    Ok(entries)
}
