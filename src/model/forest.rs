//! Random forest classifier
//!
//! Each tree is fit on a bootstrap sample drawn from a per-tree RNG that is
//! itself seeded from the forest seed, so a fixed seed reproduces the model.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tree::{DecisionTree, TreeConfig};
use crate::{F1Error, Result, TrainingConfig};

/// Configuration for the forest
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn from_training_config(config: &TrainingConfig) -> Self {
        ForestConfig {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            seed: config.seed,
        }
    }
}

/// A fitted random forest
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fit on feature rows `x` and class labels `y`
    pub fn fit(x: &[Vec<f64>], y: &[u8], config: &ForestConfig) -> Result<Self> {
        if x.is_empty() {
            return Err(F1Error::InsufficientData(
                "cannot fit a forest on zero rows".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(F1Error::InsufficientData(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(F1Error::InsufficientData(
                "feature rows must share a non-zero width".to_string(),
            ));
        }
        if config.n_estimators == 0 {
            return Err(F1Error::Config("n_estimators must be at least 1".to_string()));
        }

        let labels: Vec<usize> = y.iter().map(|&c| c as usize).collect();
        let n_classes = labels.iter().max().map_or(2, |&m| (m + 1).max(2));

        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: ((n_features as f64).sqrt() as usize).max(1),
        };

        let n = x.len();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let trees = (0..config.n_estimators)
            .map(|_| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                let bootstrap: Vec<usize> = (0..n).map(|_| tree_rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, &labels, bootstrap, n_classes, &tree_config, &mut tree_rng)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Fitted {} trees on {} rows (mean depth {:.1})",
            trees.len(),
            n,
            trees.iter().map(|t| t.depth()).sum::<usize>() as f64 / trees.len() as f64
        );

        Ok(RandomForest {
            trees,
            n_classes,
            n_features,
        })
    }

    /// Mean class probabilities over all trees
    ///
    /// The row must have the width the forest was fitted on.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features {
            return Err(F1Error::InsufficientData(format!(
                "row has {} features, model expects {}",
                row.len(),
                self.n_features
            )));
        }
        let mut probs = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in probs.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        probs.iter_mut().for_each(|p| *p /= n_trees);
        Ok(probs)
    }

    /// Most probable class for a row; ties go to the lower class
    pub fn predict_one(&self, row: &[f64]) -> Result<u8> {
        let probs = self.predict_proba(row)?;
        let mut best = 0;
        for (class, &p) in probs.iter().enumerate().skip(1) {
            if p > probs[best] {
                best = class;
            }
        }
        Ok(best as u8)
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}
