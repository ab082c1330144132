//! CART decision tree classifier
//!
//! Gini impurity splits on midpoints between consecutive distinct values,
//! with a random subset of features considered at each node.

use rand::rngs::StdRng;

/// Configuration for a single tree
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Maximum depth (None grows until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before it may split
    pub min_samples_split: usize,
    /// Features drawn per split
    pub max_features: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_depth: None,
            min_samples_split: 2,
            max_features: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        /// Class distribution of the training samples that reached the leaf
        probs: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Gini impurity of a class count vector
pub fn gini(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Best split found for a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// A fitted decision tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
    n_classes: usize,
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    config: &'a TreeConfig,
    rng: &'a mut StdRng,
}

impl DecisionTree {
    /// Fit on the rows of `x` selected by `indices` (repeats allowed)
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        indices: Vec<usize>,
        n_classes: usize,
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            n_classes,
            config,
            rng,
        };
        let root = builder.build(indices, 0);
        DecisionTree { root, n_classes }
    }

    /// Class distribution of the leaf a row falls into
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { probs } => return probs,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }

    pub fn n_leaves(&self) -> usize {
        fn leaves(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        leaves(&self.root)
    }
}

impl Builder<'_> {
    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize]) -> Node {
        let total: usize = counts.iter().sum();
        let probs = counts
            .iter()
            .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
            .collect();
        Node::Leaf { probs }
    }

    fn build(&mut self, indices: Vec<usize>, depth: usize) -> Node {
        let counts = self.class_counts(&indices);
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);

        if is_pure || depth_reached || indices.len() < self.config.min_samples_split {
            return self.leaf(&counts);
        }

        let Some(split) = self.best_split(&indices) else {
            return self.leaf(&counts);
        };

        log::trace!(
            "depth {}: x[{}] <= {} (impurity {:.4} -> {:.4})",
            depth,
            split.feature,
            split.threshold,
            gini(&counts),
            split.impurity
        );

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[i][split.feature] <= split.threshold);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    /// Lowest weighted child impurity over the sampled features
    fn best_split(&mut self, indices: &[usize]) -> Option<SplitCandidate> {
        let n_features = self.x[indices[0]].len();
        let max_features = self.config.max_features.clamp(1, n_features);
        let mut features =
            rand::seq::index::sample(&mut *self.rng, n_features, max_features).into_vec();
        features.sort_unstable();

        let total_counts = self.class_counts(indices);
        let n = indices.len() as f64;
        let mut best: Option<SplitCandidate> = None;

        for feature in features {
            let mut sorted: Vec<usize> = indices.to_vec();
            sorted.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_counts = vec![0; self.n_classes];
            for pos in 0..sorted.len() - 1 {
                left_counts[self.y[sorted[pos]]] += 1;

                let here = self.x[sorted[pos]][feature];
                let next = self.x[sorted[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let right_counts: Vec<usize> = total_counts
                    .iter()
                    .zip(&left_counts)
                    .map(|(t, l)| t - l)
                    .collect();
                let n_left = (pos + 1) as f64;
                let impurity = (n_left * gini(&left_counts)
                    + (n - n_left) * gini(&right_counts))
                    / n;

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }
}
