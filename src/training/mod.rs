//! Model training
//!
//! Train/test split, forest fitting and classification metrics.

pub mod metrics;
pub mod split;
pub mod trainer;

pub use metrics::{accuracy, win_rate_by_qualifying, ClassificationReport, ClassMetrics};
pub use split::{train_test_split, TrainTestSplit};
pub use trainer::{features_and_labels, Trainer, TrainingOutcome};
