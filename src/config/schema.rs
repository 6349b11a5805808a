use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::history::Category;
use crate::scoring::ScoringConfig;

fn default_cache_ttl() -> String {
    "10m".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Spreadsheet holding the historical results (or CMWMC_SPREADSHEET_ID)
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// How long fetched ranges stay cached, e.g. "10m" or "1h"
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,

    #[serde(default)]
    pub theme: ThemeSetting,

    #[serde(default)]
    pub ranges: RangeConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            cache_ttl: default_cache_ttl(),
            theme: ThemeSetting::default(),
            ranges: RangeConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Config {
    /// Parsed cache TTL
    pub fn cache_ttl(&self) -> anyhow::Result<Duration> {
        humantime::parse_duration(self.cache_ttl.trim())
            .map_err(|e| anyhow::anyhow!("cache_ttl: invalid duration '{}' - {}", self.cache_ttl, e))
    }
}

/// Spreadsheet range for each historical category (A1 notation)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct RangeConfig {
    pub individual: String,
    pub team_individual: String,
    pub guts: String,
    pub relay: String,
    pub overall: String,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            individual: "Individual!Z1:Z57".to_string(),
            team_individual: "Team Overall!C2:C22".to_string(),
            guts: "Team Overall!C2:C22".to_string(),
            relay: "Team Overall!D2:D22".to_string(),
            overall: "Team Overall!H2:H22".to_string(),
        }
    }
}

impl RangeConfig {
    /// True when the ranges are the shipped defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Individual => &self.individual,
            Category::TeamIndividual => &self.team_individual,
            Category::Guts => &self.guts,
            Category::Relay => &self.relay,
            Category::Overall => &self.overall,
        }
    }
}

/// TUI color theme selection
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSetting {
    #[default]
    Auto,
    Dark,
    Light,
}
