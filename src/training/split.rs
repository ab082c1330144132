//! Seeded train/test partition

use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{F1Error, Result};

/// Feature rows and labels split into train and test partitions
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
}

/// Rows held out for a given fraction: `ceil(test_size * n)`
pub fn test_count(n: usize, test_size: f64) -> usize {
    (test_size * n as f64).ceil() as usize
}

/// Shuffle row indices with `seed`; the first `ceil(test_size * n)` go to test
pub fn train_test_split(
    x: &[Vec<f64>],
    y: &[u8],
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if x.len() != y.len() {
        return Err(F1Error::InsufficientData(format!(
            "{} feature rows but {} labels",
            x.len(),
            y.len()
        )));
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(F1Error::Config(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n = x.len();
    let n_test = test_count(n, test_size);
    if n_test == 0 || n_test >= n {
        return Err(F1Error::InsufficientData(format!(
            "{} rows cannot be split with test_size {}",
            n, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);

    log::info!(
        "Split {} rows: train={}, test={}",
        n,
        train_idx.len(),
        test_idx.len()
    );

    Ok(TrainTestSplit {
        x_train: train_idx.iter().map(|&i| x[i].clone()).collect(),
        x_test: test_idx.iter().map(|&i| x[i].clone()).collect(),
        y_train: train_idx.iter().map(|&i| y[i]).collect(),
        y_test: test_idx.iter().map(|&i| y[i]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> (Vec<Vec<f64>>, Vec<u8>) {
        let x = (0..n).map(|i| vec![i as f64]).collect();
        let y = (0..n).map(|i| u8::from(i % 4 == 0)).collect();
        (x, y)
    }

    #[test]
    fn test_partition_sizes_round_test_up() {
        assert_eq!(test_count(10, 0.3), 3);
        assert_eq!(test_count(11, 0.3), 4);

        let (x, y) = rows(11);
        let split = train_test_split(&x, &y, 0.3, 42).unwrap();
        assert_eq!(split.x_test.len(), 4);
        assert_eq!(split.x_train.len(), 7);
        assert_eq!(split.y_test.len(), 4);
        assert_eq!(split.y_train.len(), 7);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let (x, y) = rows(40);
        let split = train_test_split(&x, &y, 0.3, 42).unwrap();

        let mut seen: Vec<usize> = split
            .x_train
            .iter()
            .chain(&split.x_test)
            .map(|row| row[0] as usize)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..40).collect::<Vec<_>>());

        // Labels travel with their rows
        for (row, &label) in split.x_test.iter().zip(&split.y_test) {
            assert_eq!(label, u8::from(row[0] as usize % 4 == 0));
        }
    }

    #[test]
    fn test_seed_determines_split() {
        let (x, y) = rows(30);
        let a = train_test_split(&x, &y, 0.3, 42).unwrap();
        let b = train_test_split(&x, &y, 0.3, 42).unwrap();
        let c = train_test_split(&x, &y, 0.3, 7).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.x_test, c.x_test);
    }

    #[test]
    fn test_too_few_rows() {
        let (x, y) = rows(1);
        assert!(matches!(
            train_test_split(&x, &y, 0.3, 42),
            Err(F1Error::InsufficientData(_))
        ));
        let (x, y) = rows(0);
        assert!(train_test_split(&x, &y, 0.3, 42).is_err());
    }
}
