//! Majority-vote prediction for the random forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::ForestError;
use crate::forest::RandomForest;

/// Per-class vote counts for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    votes: Vec<usize>,
}

impl VoteTally {
    /// Return the class with the most votes; ties go to the lowest class index.
    #[must_use]
    pub fn winner(&self) -> usize {
        self.votes
            .iter()
            .enumerate()
            .fold((0, 0), |best, (class, &count)| {
                if count > best.1 { (class, count) } else { best }
            })
            .0
    }

    /// Return the fraction of trees that voted for `class`.
    #[must_use]
    pub fn share(&self, class: usize) -> f64 {
        let total: usize = self.votes.iter().sum();
        match self.votes.get(class) {
            Some(&v) if total > 0 => v as f64 / total as f64,
            _ => 0.0,
        }
    }

    /// Return the raw vote counts indexed by class.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.votes
    }
}

impl RandomForest {
    /// Predict the class label for a single sample by majority vote.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, ForestError> {
        Ok(self.votes(sample)?.winner())
    }

    /// Collect one vote per tree for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn votes(&self, sample: &[f64]) -> Result<VoteTally, ForestError> {
        if sample.len() != self.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.leaf_class(sample)] += 1;
        }
        Ok(VoteTally { votes })
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, ForestError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

#[cfg(test)]
mod tests {
    use super::VoteTally;
    use crate::config::{MaxFeatures, RandomForestConfig};

    #[test]
    fn tie_goes_to_lowest_class() {
        let tally = VoteTally { votes: vec![3, 3] };
        assert_eq!(tally.winner(), 0);
    }

    #[test]
    fn share_of_votes() {
        let tally = VoteTally { votes: vec![1, 3] };
        assert_eq!(tally.winner(), 1);
        assert!((tally.share(1) - 0.75).abs() < f64::EPSILON);
        assert_eq!(tally.share(5), 0.0);
    }

    #[test]
    fn votes_cover_every_tree() {
        let features = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
        let labels = vec![0, 0, 1, 1];
        let forest = RandomForestConfig::new(7)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &["x".to_string()])
            .unwrap()
            .into_forest();
        let tally = forest.votes(&[0.5]).unwrap();
        assert_eq!(tally.as_slice().iter().sum::<usize>(), 7);
        assert_eq!(forest.n_trees(), 7);
    }

    #[test]
    fn batch_rejects_wrong_width() {
        let features = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let forest = RandomForestConfig::new(2)
            .unwrap()
            .fit(&features, &[0, 1], &["a".to_string(), "b".to_string()])
            .unwrap()
            .into_forest();
        let err = forest.predict_batch(&[vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            crate::ForestError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }
}
