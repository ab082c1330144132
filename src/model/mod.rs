//! Tree ensemble classifier
//!
//! - DecisionTree: CART tree with Gini splits
//! - RandomForest: bagged trees with averaged class probabilities

pub mod forest;
pub mod tree;

pub use forest::{ForestConfig, RandomForest};
pub use tree::{DecisionTree, TreeConfig};
