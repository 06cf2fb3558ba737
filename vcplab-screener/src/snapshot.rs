//! Day-keyed run snapshots.
//!
//! A screen depends on three inputs beyond per-ticker history: the liquid
//! universe, the performance ordering behind RS ratings, and the benchmark
//! series. Snapshotting them once per day makes a same-day rerun use the
//! exact same inputs without a second provider round trip.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use vcplab_core::domain::Bar;

/// Everything a screen reads from the universe and benchmark providers,
/// frozen at fetch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// The trading day this snapshot was built for
    pub run_date: NaiveDate,

    /// Liquid universe to screen, in provider order
    pub universe: Vec<String>,

    /// Performance ordering (best first) that RS ratings are derived from
    pub ranking: Vec<String>,

    /// Benchmark symbol the RS lines divide by
    pub benchmark_symbol: String,

    /// Daily benchmark history
    pub benchmark: Vec<Bar>,
}

/// Directory of one JSON snapshot per run date.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, run_date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{run_date}.json"))
    }

    /// Persist a snapshot as `{run_date}.json`, creating the directory if needed.
    pub fn save(&self, snapshot: &RunSnapshot) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.path_for(snapshot.run_date), json)
    }

    /// Load the snapshot for a date, if one exists.
    ///
    /// An unreadable file is treated as absent so the caller rebuilds it;
    /// the stale file gets overwritten by the next save.
    pub fn load(&self, run_date: NaiveDate) -> Option<RunSnapshot> {
        let path = self.path_for(run_date);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable snapshot");
                None
            }
        }
    }

    /// Snapshot directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vcplab_core::data::synthetic_daily_bars;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_snapshot(run_date: NaiveDate) -> RunSnapshot {
        RunSnapshot {
            run_date,
            universe: vec!["NVDA".into(), "AMD".into(), "MSFT".into()],
            ranking: vec!["NVDA".into(), "MSFT".into(), "AMD".into()],
            benchmark_symbol: "^GSPC".into(),
            benchmark: synthetic_daily_bars("^GSPC", date(2024, 1, 2), run_date),
        }
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("snapshots"));
        let day = date(2024, 6, 3);
        let snapshot = sample_snapshot(day);

        store.save(&snapshot).unwrap();
        let loaded = store.load(day).expect("snapshot should load back");

        assert_eq!(loaded.run_date, day);
        assert_eq!(loaded.universe, snapshot.universe);
        assert_eq!(loaded.ranking, snapshot.ranking);
        assert_eq!(loaded.benchmark_symbol, "^GSPC");
        assert_eq!(loaded.benchmark.len(), snapshot.benchmark.len());
        assert_eq!(
            loaded.benchmark.last().map(|b| b.date),
            snapshot.benchmark.last().map(|b| b.date)
        );
    }

    #[test]
    fn load_missing_date_returns_none() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path());
        assert!(store.load(date(2024, 6, 3)).is_none());
    }

    #[test]
    fn dates_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path());

        let monday = sample_snapshot(date(2024, 6, 3));
        let mut tuesday = sample_snapshot(date(2024, 6, 4));
        tuesday.universe.push("TSLA".into());

        store.save(&monday).unwrap();
        store.save(&tuesday).unwrap();

        assert_eq!(store.load(date(2024, 6, 3)).unwrap().universe.len(), 3);
        assert_eq!(store.load(date(2024, 6, 4)).unwrap().universe.len(), 4);
    }

    #[test]
    fn corrupt_snapshot_treated_as_absent() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path());
        let day = date(2024, 6, 3);

        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join(format!("{day}.json")), "{not json").unwrap();

        assert!(store.load(day).is_none());
    }

    #[test]
    fn save_overwrites_existing_snapshot() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path());
        let day = date(2024, 6, 3);

        let first = sample_snapshot(day);
        store.save(&first).unwrap();

        let mut second = sample_snapshot(day);
        second.ranking.rotate_left(1);
        store.save(&second).unwrap();

        let loaded = store.load(day).unwrap();
        assert_eq!(loaded.ranking, second.ranking);
    }
}
