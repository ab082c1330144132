//! Per-season CSV storage of merged tables

use crate::{MergedRecord, Result, Season};
use std::path::{Path, PathBuf};

/// Column order of the season table
pub const COLUMNS: [&str; 7] = [
    "race",
    "driver",
    "team",
    "qualifying_position",
    "circuit",
    "position",
    "points",
];

/// Directory of `f1_data_{year}.csv` files
pub struct SeasonStore {
    dir: PathBuf,
}

impl SeasonStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        SeasonStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the table for a season
    pub fn path(&self, season: Season) -> PathBuf {
        self.dir.join(format!("f1_data_{}.csv", season.year()))
    }

    pub fn exists(&self, season: Season) -> bool {
        self.path(season).exists()
    }

    /// Load the season's table if a file is present
    ///
    /// Presence is the only check: a truncated or malformed file is an
    /// error here rather than a miss.
    pub fn lookup(&self, season: Season) -> Result<Option<Vec<MergedRecord>>> {
        let path = self.path(season);
        if !path.exists() {
            log::debug!("No stored table at {}", path.display());
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<MergedRecord>, csv::Error>>()?;

        log::info!("Loaded {} rows from {}", records.len(), path.display());
        Ok(Some(records))
    }

    /// Write the season's table, replacing any previous file
    pub fn save(&self, season: Season, records: &[MergedRecord]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(season);

        let mut writer = csv::Writer::from_path(&path)?;
        if records.is_empty() {
            writer.write_record(COLUMNS)?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        log::info!("Saved {} rows to {}", records.len(), path.display());
        Ok(path)
    }
}
