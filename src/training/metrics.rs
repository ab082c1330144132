//! Classification metrics and evaluation

use crate::MergedRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Fraction of predictions equal to the labels
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class breakdown plus macro and support-weighted averages
///
/// Undefined ratios (no predictions or no samples of a class) count as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Keyed by class label
    pub classes: BTreeMap<u8, ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Build a report over the labels present in either `y_true` or `y_pred`
    pub fn new(y_true: &[u8], y_pred: &[u8]) -> Self {
        let labels: BTreeSet<u8> = y_true.iter().chain(y_pred).copied().collect();

        let classes: BTreeMap<u8, ClassMetrics> = labels
            .into_iter()
            .map(|c| {
                let mut tp = 0;
                let mut predicted = 0;
                let mut support = 0;
                for (&t, &p) in y_true.iter().zip(y_pred) {
                    if p == c {
                        predicted += 1;
                    }
                    if t == c {
                        support += 1;
                        if p == c {
                            tp += 1;
                        }
                    }
                }
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                let metrics = ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support,
                };
                (c, metrics)
            })
            .collect();

        let total: usize = classes.values().map(|c| c.support).sum();
        let mean = |f: fn(&ClassMetrics) -> f64| {
            if classes.is_empty() {
                0.0
            } else {
                classes.values().map(f).sum::<f64>() / classes.len() as f64
            }
        };
        let macro_avg = ClassMetrics {
            precision: mean(|c: &ClassMetrics| c.precision),
            recall: mean(|c: &ClassMetrics| c.recall),
            f1: mean(|c: &ClassMetrics| c.f1),
            support: total,
        };
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes.values().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|c: &ClassMetrics| c.precision),
            recall: weighted(|c: &ClassMetrics| c.recall),
            f1: weighted(|c: &ClassMetrics| c.f1),
            support: total,
        };

        ClassificationReport {
            accuracy: accuracy(y_true, y_pred),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (label, c) in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, c) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        Ok(())
    }
}

/// Share of rows won from each observed qualifying position
pub fn win_rate_by_qualifying(records: &[MergedRecord]) -> BTreeMap<u32, f64> {
    let mut tallies: BTreeMap<u32, (usize, usize)> = BTreeMap::new();
    for r in records {
        let (wins, total) = tallies.entry(r.qualifying_position).or_default();
        *wins += r.is_winner() as usize;
        *total += 1;
    }
    tallies
        .into_iter()
        .map(|(pos, (wins, total))| (pos, wins as f64 / total as f64))
        .collect()
}
