//! Sources of season results

pub mod ergast;

use crate::{QualifyingRecord, RaceResultRecord, Result, Season};

/// Trait for anything that can produce a season's flat result rows
pub trait ResultsSource {
    /// Race results for every event of the season
    fn race_results(&self, season: Season) -> Result<Vec<RaceResultRecord>>;

    /// Qualifying results for every event of the season
    ///
    /// Events without a recorded qualifying session contribute no rows.
    fn qualifying_results(&self, season: Season) -> Result<Vec<QualifyingRecord>>;
}

impl<T: ResultsSource + ?Sized> ResultsSource for &T {
    fn race_results(&self, season: Season) -> Result<Vec<RaceResultRecord>> {
        (**self).race_results(season)
    }

    fn qualifying_results(&self, season: Season) -> Result<Vec<QualifyingRecord>> {
        (**self).qualifying_results(season)
    }
}
