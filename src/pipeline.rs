//! Collect, persist and train, one season at a time

use std::path::Path;

use crate::data::merge::{distinct_counts, inner_join};
use crate::data::summary::ArtifactWriter;
use crate::data::{ResultsSource, SeasonStore};
use crate::training::{Trainer, TrainingOutcome};
use crate::{Config, MergedRecord, Result, Season, TrainingConfig};

/// Season pipeline over a results source and a table store
pub struct Pipeline<S: ResultsSource> {
    source: S,
    store: SeasonStore,
    artifacts: Option<ArtifactWriter>,
}

impl<S: ResultsSource> Pipeline<S> {
    pub fn new(source: S, store: SeasonStore) -> Self {
        Pipeline {
            source,
            store,
            artifacts: None,
        }
    }

    /// Build from config: store in `data_dir`, artifacts in `results_dir`
    pub fn from_config(source: S, config: &Config) -> Self {
        let pipeline = Self::new(source, SeasonStore::new(&config.data.data_dir));
        if config.visualize {
            pipeline.with_artifacts(ArtifactWriter::new(&config.data.results_dir))
        } else {
            pipeline
        }
    }

    pub fn with_artifacts(mut self, writer: ArtifactWriter) -> Self {
        self.artifacts = Some(writer);
        self
    }

    pub fn store(&self) -> &SeasonStore {
        &self.store
    }

    /// Fetch both result sets, join them and overwrite the season's table
    pub fn collect_and_save(&self, season: Season) -> Result<Vec<MergedRecord>> {
        log::info!("Fetching F1 data for {}...", season);

        let races = self.source.race_results(season)?;
        let qualifying = self.source.qualifying_results(season)?;

        let merged = inner_join(&qualifying, &races);
        self.store.save(season, &merged)?;

        let (race_count, driver_count) = distinct_counts(&merged);
        log::info!(
            "Data collection complete: {} rows, {} races, {} drivers",
            merged.len(),
            race_count,
            driver_count
        );

        if let Some(writer) = &self.artifacts {
            writer.write(&merged, &races)?;
        }

        Ok(merged)
    }

    /// Stored table if present, otherwise collect and store it
    pub fn load_or_collect(&self, season: Season) -> Result<Vec<MergedRecord>> {
        match self.store.lookup(season)? {
            Some(records) => Ok(records),
            None => {
                log::info!("No stored table for {}, collecting", season);
                self.collect_and_save(season)
            }
        }
    }

    /// Load (or collect) the season and train the winner classifier
    pub fn train(&self, season: Season, config: &TrainingConfig) -> Result<TrainingOutcome> {
        let records = self.load_or_collect(season)?;
        Trainer::new(config.clone()).train(&records)
    }
}

/// Create the data, results and models directories
pub fn prepare_directories(config: &Config) -> Result<()> {
    for dir in [
        &config.data.data_dir,
        &config.data.results_dir,
        &config.data.models_dir,
    ] {
        std::fs::create_dir_all(Path::new(dir))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{F1Error, QualifyingRecord, RaceResultRecord};
    use std::cell::Cell;

    /// In-memory source counting how often it is asked for data
    struct FakeSource {
        races: Vec<RaceResultRecord>,
        qualifying: Vec<QualifyingRecord>,
        calls: Cell<usize>,
        fail: bool,
    }

    impl FakeSource {
        fn new(n_races: usize) -> Self {
            let mut races = Vec::new();
            let mut qualifying = Vec::new();
            for race in 0..n_races {
                for grid in 1..=5u32 {
                    let name = format!("Grand Prix {}", race);
                    let driver = format!("Driver {}", grid);
                    qualifying.push(QualifyingRecord {
                        race: name.clone(),
                        driver: driver.clone(),
                        team: "Team".to_string(),
                        qualifying_position: grid,
                    });
                    races.push(RaceResultRecord {
                        race: name,
                        circuit: "Circuit".to_string(),
                        driver,
                        team: "Team".to_string(),
                        position: grid,
                        points: (6 - grid) as f64,
                    });
                }
            }
            FakeSource {
                races,
                qualifying,
                calls: Cell::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            FakeSource {
                fail: true,
                ..Self::new(0)
            }
        }
    }

    impl ResultsSource for FakeSource {
        fn race_results(&self, season: Season) -> Result<Vec<RaceResultRecord>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(F1Error::Api {
                    season,
                    message: "HTTP 503".to_string(),
                });
            }
            Ok(self.races.clone())
        }

        fn qualifying_results(&self, _season: Season) -> Result<Vec<QualifyingRecord>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.qualifying.clone())
        }
    }

    #[test]
    fn test_collect_writes_table_and_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(4);
        let pipeline = Pipeline::new(&source, SeasonStore::new(dir.path().join("data")))
            .with_artifacts(ArtifactWriter::new(dir.path().join("results")));

        let merged = pipeline.collect_and_save(Season(2022)).unwrap();
        assert_eq!(merged.len(), 20);
        assert!(pipeline.store().exists(Season(2022)));
        assert!(dir.path().join("results/qual_vs_race.csv").exists());
        assert!(dir.path().join("results/top_drivers.csv").exists());
    }

    #[test]
    fn test_load_or_collect_uses_stored_table() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(3);
        let pipeline = Pipeline::new(&source, SeasonStore::new(dir.path()));

        let first = pipeline.load_or_collect(Season(2021)).unwrap();
        assert_eq!(source.calls.get(), 2);

        let second = pipeline.load_or_collect(Season(2021)).unwrap();
        assert_eq!(source.calls.get(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::failing();
        let pipeline = Pipeline::new(&source, SeasonStore::new(dir.path()));

        let err = pipeline.load_or_collect(Season(2022)).unwrap_err();
        assert!(matches!(err, F1Error::Api { .. }));
        assert!(!pipeline.store().exists(Season(2022)));
    }

    #[test]
    fn test_train_from_collected_season() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(12);
        let pipeline = Pipeline::new(&source, SeasonStore::new(dir.path()));

        let outcome = pipeline
            .train(Season(2022), &TrainingConfig::default())
            .unwrap();
        assert_eq!(outcome.x_test.len(), 18);
        assert_eq!(outcome.x_train.len(), 42);
        // Pole always wins in this season
        assert_eq!(outcome.accuracy, 1.0);
        assert_eq!(outcome.win_rates[&1], 1.0);
    }

    #[test]
    fn test_prepare_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let mut config = Config::default();
        config.data.data_dir = format!("{}/data/raw", root);
        config.data.results_dir = format!("{}/results", root);
        config.data.models_dir = format!("{}/models", root);

        prepare_directories(&config).unwrap();
        assert!(dir.path().join("data/raw").is_dir());
        assert!(dir.path().join("models").is_dir());
    }
}
