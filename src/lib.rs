//! Formula 1 race winner prediction
//!
//! Fetches race and qualifying results per season, merges them into a flat
//! table and fits a random forest predicting the winner from grid position.

pub mod data;
pub mod model;
pub mod pipeline;
pub mod training;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// First season of the world championship
pub const FIRST_SEASON: u16 = 1950;

/// A championship season, identified by its year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Season(pub u16);

impl Season {
    /// Create a season, rejecting years outside the championship's history
    pub fn new(year: u16) -> Result<Self> {
        let current_year = u16::try_from(chrono::Utc::now().year()).unwrap_or(u16::MAX);
        if !(FIRST_SEASON..=current_year).contains(&year) {
            return Err(F1Error::InvalidSeason(year));
        }
        Ok(Season(year))
    }

    pub fn year(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One classified finisher of a race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResultRecord {
    pub race: String,
    pub circuit: String,
    pub driver: String,
    pub team: String,
    pub position: u32,
    pub points: f64,
}

/// One entrant of a qualifying session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingRecord {
    pub race: String,
    pub driver: String,
    pub team: String,
    pub qualifying_position: u32,
}

/// A row of the season table: qualifying joined with the race result
///
/// Field order is the column order of the persisted CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub race: String,
    pub driver: String,
    pub team: String,
    pub qualifying_position: u32,
    pub circuit: String,
    pub position: u32,
    pub points: f64,
}

impl MergedRecord {
    /// Binary label: 1 if the driver won the race
    pub fn is_winner(&self) -> u8 {
        u8::from(self.position == 1)
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum F1Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Results API error for season {season}: {message}")]
    Api { season: Season, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid season: {0} (expected 1950 to the current year)")]
    InvalidSeason(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

pub type Result<T> = std::result::Result<T, F1Error>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub season: u16,
    #[serde(default = "default_visualize")]
    pub visualize: bool,
    pub data: DataConfig,
    pub training: TrainingConfig,
}

fn default_visualize() -> bool {
    true
}

fn default_request_delay_ms() -> u64 {
    250
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub base_url: String,
    pub data_dir: String,
    pub results_dir: String,
    pub models_dir: String,
    pub page_limit: u32,
    /// Minimum pause between API page requests, in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub test_size: f64,
    pub seed: u64,
    pub n_estimators: usize,
    pub min_samples_split: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            test_size: 0.3,
            seed: 42,
            n_estimators: 100,
            min_samples_split: 2,
            max_depth: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            season: 2022,
            visualize: true,
            data: DataConfig {
                base_url: "https://api.jolpi.ca/ergast/f1".to_string(),
                data_dir: "data/raw".to_string(),
                results_dir: "results".to_string(),
                models_dir: "models".to_string(),
                page_limit: 100,
                request_delay_ms: default_request_delay_ms(),
                cache_dir: None,
            },
            training: TrainingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            F1Error::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| F1Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| F1Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        Season::new(self.season)?;

        let t = &self.training;
        if !(t.test_size > 0.0 && t.test_size < 1.0) {
            return Err(F1Error::Config(format!(
                "test_size must be in (0, 1), got {}",
                t.test_size
            )));
        }
        if t.n_estimators == 0 {
            return Err(F1Error::Config("n_estimators must be at least 1".to_string()));
        }
        if t.min_samples_split < 2 {
            return Err(F1Error::Config(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.data.page_limit == 0 {
            return Err(F1Error::Config("page_limit must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn season(&self) -> Result<Season> {
        Season::new(self.season)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(position: u32) -> MergedRecord {
        MergedRecord {
            race: "Bahrain Grand Prix".to_string(),
            driver: "Charles Leclerc".to_string(),
            team: "Ferrari".to_string(),
            qualifying_position: 1,
            circuit: "Bahrain International Circuit".to_string(),
            position,
            points: 0.0,
        }
    }

    #[test]
    fn test_season_range() {
        assert!(Season::new(2022).is_ok());
        assert!(Season::new(FIRST_SEASON).is_ok());
        assert!(matches!(Season::new(1949), Err(F1Error::InvalidSeason(1949))));
        assert!(Season::new(9999).is_err());
    }

    #[test]
    fn test_is_winner_only_for_first_place() {
        assert_eq!(merged(1).is_winner(), 1);
        assert_eq!(merged(2).is_winner(), 0);
        assert_eq!(merged(20).is_winner(), 0);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.training.test_size, 0.3);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.n_estimators, 100);
    }

    #[test]
    fn test_config_round_trip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.season = 2021;
        config.training.max_depth = Some(6);
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded.season, 2021);
        assert_eq!(loaded.training.max_depth, Some(6));
        assert_eq!(loaded.data.cache_dir, None);
    }

    #[test]
    fn test_request_delay_defaults_when_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
season = 2022

[data]
base_url = "https://api.jolpi.ca/ergast/f1"
data_dir = "data/raw"
results_dir = "results"
models_dir = "models"
page_limit = 100

[training]
test_size = 0.3
seed = 42
n_estimators = 100
min_samples_split = 2
"#,
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.data.request_delay_ms, 250);
        assert!(config.visualize);
    }

    #[test]
    fn test_config_rejects_bad_test_size() {
        let mut config = Config::default();
        config.training.test_size = 1.0;
        assert!(matches!(config.validate(), Err(F1Error::Config(_))));
    }
}
