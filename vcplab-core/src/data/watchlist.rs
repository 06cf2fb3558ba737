//! Watchlist configuration.
//!
//! A TOML file of named ticker groups. Used as the screening universe when
//! Finviz is unreachable or when the user wants a focused run over their
//! own list instead of the full liquid universe.

use super::provider::DataError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watchlist {
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Watchlist {
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::ValidationError(format!("read watchlist file: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        toml::from_str(content)
            .map_err(|e| DataError::ValidationError(format!("parse watchlist TOML: {e}")))
    }

    pub fn to_toml(&self) -> Result<String, DataError> {
        toml::to_string_pretty(self)
            .map_err(|e| DataError::ValidationError(format!("serialize watchlist: {e}")))
    }

    /// All tickers across all groups, in group order.
    pub fn all_tickers(&self) -> Vec<&str> {
        self.groups
            .values()
            .flat_map(|tickers| tickers.iter().map(|t| t.as_str()))
            .collect()
    }

    pub fn group_tickers(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(|v| v.as_slice())
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(|s| s.as_str()).collect()
    }

    pub fn ticker_count(&self) -> usize {
        self.groups.values().map(|v| v.len()).sum()
    }

    /// Starter watchlist of liquid growth names plus index ETFs.
    pub fn default_growth() -> Self {
        let mut groups = BTreeMap::new();

        let insert = |groups: &mut BTreeMap<String, Vec<String>>, name: &str, tickers: &[&str]| {
            groups.insert(
                name.to_string(),
                tickers.iter().map(|t| t.to_string()).collect(),
            );
        };

        insert(
            &mut groups,
            "Semiconductors",
            &["NVDA", "AMD", "AVGO", "MRVL", "MU", "ARM", "SMCI"],
        );
        insert(
            &mut groups,
            "Software",
            &["CRM", "NOW", "PLTR", "CRWD", "DDOG", "NET", "SNOW"],
        );
        insert(
            &mut groups,
            "Consumer",
            &["COST", "CMG", "LULU", "DECK", "ELF", "CELH"],
        );
        insert(
            &mut groups,
            "Industrials",
            &["URI", "PWR", "ETN", "VRT", "AXON"],
        );
        insert(&mut groups, "Benchmarks", &["SPY", "QQQ", "IWM"]);

        Self { groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_watchlist_has_groups() {
        let w = Watchlist::default_growth();
        assert!(w.group_names().contains(&"Semiconductors"));
        assert!(w.group_names().contains(&"Benchmarks"));
        assert!(w.ticker_count() > 20);
    }

    #[test]
    fn toml_roundtrip() {
        let w = Watchlist::default_growth();
        let toml_str = w.to_toml().unwrap();
        let parsed = Watchlist::from_toml(&toml_str).unwrap();
        assert_eq!(w.ticker_count(), parsed.ticker_count());
        assert_eq!(w.group_names(), parsed.group_names());
    }

    #[test]
    fn all_tickers_flattens_groups() {
        let w = Watchlist::default_growth();
        let all = w.all_tickers();
        assert!(all.contains(&"NVDA"));
        assert!(all.contains(&"SPY"));
        assert_eq!(all.len(), w.ticker_count());
    }

    #[test]
    fn group_lookup() {
        let w = Watchlist::default_growth();
        let semis = w.group_tickers("Semiconductors").unwrap();
        assert!(semis.contains(&"NVDA".to_string()));
        assert!(w.group_tickers("Mining").is_none());
    }

    #[test]
    fn malformed_toml_is_a_validation_error() {
        let err = Watchlist::from_toml("groups = 3").unwrap_err();
        assert!(matches!(err, DataError::ValidationError(_)));
    }
}
