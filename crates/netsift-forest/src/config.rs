//! Configuration builder for random forest training.

use std::fmt;
use std::str::FromStr;

use crate::error::ForestError;
use crate::result::RandomForestResult;
use crate::split::SplitCriterion;

/// Strategy for determining the number of features to consider at each split.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1.
    Sqrt,
    /// `floor(log2(n_features))`, at least 1.
    Log2,
    /// A fixed count.
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidMaxFeatures`] if the count is 0 or exceeds `n_features`.
    pub fn resolve(self, n_features: usize) -> Result<usize, ForestError> {
        let resolved = match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
            MaxFeatures::Log2 => ((n_features as f64).log2().floor() as usize).max(1),
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(ForestError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

impl fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxFeatures::Sqrt => f.write_str("sqrt"),
            MaxFeatures::Log2 => f.write_str("log2"),
            MaxFeatures::Fixed(n) => write!(f, "{n}"),
            MaxFeatures::All => f.write_str("all"),
        }
    }
}

impl FromStr for MaxFeatures {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            other => other.parse::<usize>().map(MaxFeatures::Fixed).map_err(|_| {
                format!("unknown max-features value: {other} (expected sqrt, log2, all, or a count)")
            }),
        }
    }
}

/// Configuration for random forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default |
/// |---------------------|---------|
/// | `max_features`      | `Sqrt`  |
/// | `max_depth`         | `None`  |
/// | `min_samples_split` | 2       |
/// | `min_samples_leaf`  | 1       |
/// | `criterion`         | `Gini`  |
/// | `seed`              | 42      |
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) seed: u64,
}

impl Default for RandomForestConfig {
    /// 100 trees with the defaults above.
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            seed: 42,
        }
    }
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            ..Self::default()
        })
    }

    /// Set the max features strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the seed that governs bootstrap draws and feature subsampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the max features strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum samples required in each leaf.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a random forest.
    ///
    /// `features[sample_idx][feature_idx]` is row-major; NaN marks a missing
    /// value. `labels[sample_idx]` are zero-based class labels.
    /// `feature_names` names each feature column.
    ///
    /// # Errors
    ///
    /// | Variant                                 | When                                             |
    /// |-----------------------------------------|--------------------------------------------------|
    /// | [`ForestError::EmptyTrainingSet`]       | `features` is empty                              |
    /// | [`ForestError::ZeroFeatures`]           | rows have zero feature columns                   |
    /// | [`ForestError::LabelCountMismatch`]     | `labels.len() != features.len()`                 |
    /// | [`ForestError::FeatureCountMismatch`]   | rows have inconsistent lengths                   |
    /// | [`ForestError::InfiniteValue`]          | any value is infinite                            |
    /// | [`ForestError::InvalidMaxFeatures`]     | resolved max_features is outside [1, n_features] |
    /// | [`ForestError::InvalidMaxDepth`]        | `max_depth` is `Some(0)`                         |
    /// | [`ForestError::InvalidMinSamplesSplit`] | `min_samples_split` < 2                          |
    /// | [`ForestError::InvalidMinSamplesLeaf`]  | `min_samples_leaf` < 1                           |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<RandomForestResult, ForestError> {
        crate::forest::train(self, features, labels, feature_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_of_41_features_is_6() {
        assert_eq!(MaxFeatures::Sqrt.resolve(41).unwrap(), 6);
    }

    #[test]
    fn sqrt_never_below_one() {
        assert_eq!(MaxFeatures::Sqrt.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Log2.resolve(1).unwrap(), 1);
    }

    #[test]
    fn fixed_above_feature_count_rejected() {
        let err = MaxFeatures::Fixed(5).resolve(3).unwrap_err();
        assert!(matches!(
            err,
            ForestError::InvalidMaxFeatures {
                max_features: 5,
                n_features: 3
            }
        ));
    }

    #[test]
    fn parse_max_features() {
        assert_eq!("sqrt".parse::<MaxFeatures>().unwrap(), MaxFeatures::Sqrt);
        assert_eq!("all".parse::<MaxFeatures>().unwrap(), MaxFeatures::All);
        assert_eq!("7".parse::<MaxFeatures>().unwrap(), MaxFeatures::Fixed(7));
        assert!("many".parse::<MaxFeatures>().is_err());
    }

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            RandomForestConfig::new(0),
            Err(ForestError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn builder_sets_fields() {
        let config = RandomForestConfig::new(10)
            .unwrap()
            .with_max_depth(Some(4))
            .with_min_samples_leaf(3)
            .with_criterion(SplitCriterion::Entropy)
            .with_seed(7);
        assert_eq!(config.n_trees(), 10);
        assert_eq!(config.max_depth(), Some(4));
        assert_eq!(config.min_samples_leaf(), 3);
        assert_eq!(config.criterion(), SplitCriterion::Entropy);
        assert_eq!(config.seed(), 7);
        assert_eq!(config.max_features(), MaxFeatures::Sqrt);
    }
}
