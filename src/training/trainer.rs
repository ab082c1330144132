//! Winner classifier training and evaluation

use std::collections::BTreeMap;

use crate::model::{ForestConfig, RandomForest};
use crate::training::metrics::{accuracy, win_rate_by_qualifying, ClassificationReport};
use crate::training::split::{train_test_split, TrainTestSplit};
use crate::{F1Error, MergedRecord, Result, TrainingConfig};

/// Name of each feature column, in matrix order
pub const FEATURES: [&str; 1] = ["qualifying_position"];

/// Feature matrix and `is_winner` labels for a merged table
pub fn features_and_labels(records: &[MergedRecord]) -> (Vec<Vec<f64>>, Vec<u8>) {
    let x = records
        .iter()
        .map(|r| vec![r.qualifying_position as f64])
        .collect();
    let y = records.iter().map(MergedRecord::is_winner).collect();
    (x, y)
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: RandomForest,
    /// Held-out accuracy
    pub accuracy: f64,
    pub train_accuracy: f64,
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    /// Report on the held-out partition
    pub report: ClassificationReport,
    /// Empirical win rate per qualifying position over the whole table
    pub win_rates: BTreeMap<u32, f64>,
}

impl TrainingOutcome {
    /// Win rates for positions that produced at least one win
    pub fn winning_positions(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.win_rates
            .iter()
            .filter(|(_, rate)| **rate > 0.0)
            .map(|(&pos, &rate)| (pos, rate))
    }
}

/// Trainer for the winner classifier
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Trainer { config }
    }

    /// Split, fit and evaluate on a merged season table
    pub fn train(&self, records: &[MergedRecord]) -> Result<TrainingOutcome> {
        if records.is_empty() {
            return Err(F1Error::InsufficientData(
                "merged table has no rows".to_string(),
            ));
        }

        let (x, y) = features_and_labels(records);
        let TrainTestSplit {
            x_train,
            x_test,
            y_train,
            y_test,
        } = train_test_split(&x, &y, self.config.test_size, self.config.seed)?;

        let forest_config = ForestConfig::from_training_config(&self.config);
        log::info!(
            "Training forest of {} trees on {} ({} rows, seed {})",
            forest_config.n_estimators,
            FEATURES.join(", "),
            x_train.len(),
            forest_config.seed
        );
        let model = RandomForest::fit(&x_train, &y_train, &forest_config)?;

        let train_pred = model.predict(&x_train)?;
        let test_pred = model.predict(&x_test)?;

        let train_accuracy = accuracy(&y_train, &train_pred);
        let test_accuracy = accuracy(&y_test, &test_pred);
        let report = ClassificationReport::new(&y_test, &test_pred);

        log::info!(
            "Train accuracy {:.4}, test accuracy {:.4}",
            train_accuracy,
            test_accuracy
        );

        Ok(TrainingOutcome {
            model,
            accuracy: test_accuracy,
            train_accuracy,
            x_train,
            x_test,
            y_train,
            y_test,
            report,
            win_rates: win_rate_by_qualifying(records),
        })
    }
}
