//! Seeded train/test partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::error::PrepError;
use crate::matrix::EncodedMatrix;

/// Splitter configuration.
///
/// Construct via [`Splitter::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splitter {
    test_ratio: f64,
    seed: u64,
}

/// A disjoint train/test partition of an encoded matrix.
#[derive(Debug, Clone)]
pub struct Split {
    /// Rows used for fitting.
    pub train: EncodedMatrix,
    /// Rows held out for evaluation.
    pub test: EncodedMatrix,
    /// Original row index of each training row.
    pub train_indices: Vec<usize>,
    /// Original row index of each test row.
    pub test_indices: Vec<usize>,
}

impl Splitter {
    /// Create a splitter holding out `test_ratio` of the rows.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidTestRatio`] unless `0 < test_ratio < 1`.
    pub fn new(test_ratio: f64) -> Result<Self, PrepError> {
        if !(test_ratio > 0.0 && test_ratio < 1.0) {
            return Err(PrepError::InvalidTestRatio { ratio: test_ratio });
        }
        Ok(Self {
            test_ratio,
            seed: 42,
        })
    }

    /// Set the random seed for the row permutation.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the test ratio.
    #[must_use]
    pub fn test_ratio(&self) -> f64 {
        self.test_ratio
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the number of test rows for a matrix of `n_rows`.
    #[must_use]
    pub fn n_test(&self, n_rows: usize) -> usize {
        (self.test_ratio * n_rows as f64).round() as usize
    }

    /// Partition `matrix` into train and test subsets.
    ///
    /// Shuffles the row indices with a ChaCha8 RNG seeded from `seed`; the
    /// first `round(test_ratio * n)` shuffled indices form the test subset
    /// and the remainder the training subset. No stratification.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::DegenerateSplit`] if either subset would be empty.
    #[instrument(skip_all, fields(n_rows = matrix.n_rows(), test_ratio = self.test_ratio, seed = self.seed))]
    pub fn split(&self, matrix: &EncodedMatrix) -> Result<Split, PrepError> {
        let n_rows = matrix.n_rows();
        let n_test = self.n_test(n_rows);
        if n_test == 0 || n_test >= n_rows {
            return Err(PrepError::DegenerateSplit { n_rows, n_test });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..n_rows).collect();
        order.shuffle(&mut rng);

        let (test_indices, train_indices) = order.split_at(n_test);
        let split = Split {
            train: matrix.select(train_indices),
            test: matrix.select(test_indices),
            train_indices: train_indices.to_vec(),
            test_indices: test_indices.to_vec(),
        };

        info!(
            n_train = split.train.n_rows(),
            n_test = split.test.n_rows(),
            "rows partitioned"
        );
        Ok(split)
    }
}
