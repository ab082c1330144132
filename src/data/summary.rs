//! Descriptive season artifacts
//!
//! The data behind the qualifying-vs-finish scatter and the points ranking,
//! written as small CSV tables next to the model results.

use crate::{MergedRecord, RaceResultRecord, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Number of drivers kept in the points ranking
pub const TOP_DRIVERS: usize = 10;

/// Total points per driver over the race results, highest first
///
/// Equal totals keep the order in which drivers first appear.
pub fn top_drivers_by_points(races: &[RaceResultRecord], limit: usize) -> Vec<(String, f64)> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for r in races {
        let total = totals.entry(r.driver.as_str()).or_insert_with(|| {
            order.push(r.driver.as_str());
            0.0
        });
        *total += r.points;
    }

    let mut ranking: Vec<(String, f64)> = order
        .into_iter()
        .map(|d| (d.to_string(), totals[d]))
        .collect();
    // Stable sort keeps first-seen order for ties
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranking.truncate(limit);
    ranking
}

/// (qualifying position, finishing position) for every merged row
pub fn qualifying_vs_finish(records: &[MergedRecord]) -> Vec<(u32, u32)> {
    records
        .iter()
        .map(|r| (r.qualifying_position, r.position))
        .collect()
}

/// Writes season artifacts into the results directory
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        ArtifactWriter {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Write `qual_vs_race.csv` and `top_drivers.csv`
    pub fn write(
        &self,
        merged: &[MergedRecord],
        races: &[RaceResultRecord],
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.dir)?;

        let scatter_path = self.dir.join("qual_vs_race.csv");
        let mut writer = csv::Writer::from_path(&scatter_path)?;
        writer.write_record(["qualifying_position", "position"])?;
        for (qualifying, finish) in qualifying_vs_finish(merged) {
            writer.write_record([qualifying.to_string(), finish.to_string()])?;
        }
        writer.flush()?;

        let ranking_path = self.dir.join("top_drivers.csv");
        let mut writer = csv::Writer::from_path(&ranking_path)?;
        writer.write_record(["driver", "points"])?;
        for (driver, points) in top_drivers_by_points(races, TOP_DRIVERS) {
            writer.write_record([driver, points.to_string()])?;
        }
        writer.flush()?;

        log::info!("Wrote season artifacts to {}", self.dir.display());
        Ok(vec![scatter_path, ranking_path])
    }
}
