//! Random forest classification and evaluation for network traffic records.
//!
//! Provides a hand-rolled random forest with CART decision trees, Gini/Entropy
//! split criteria, missing-value aware splits, parallel training via rayon,
//! feature importances, and a confusion-matrix based classification report.

mod config;
mod confusion;
mod error;
mod forest;
mod importance;
mod node;
mod predict;
mod report;
mod result;
mod split;
mod tree;

pub use config::{MaxFeatures, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::ForestError;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::VoteTally;
pub use report::{AveragedMetrics, ClassificationReport, NamedClassMetrics};
pub use result::{RandomForestResult, TrainingMetadata};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};

/// Validate a row-major training set and return its feature count.
///
/// NaN cells are accepted as missing values; infinities are rejected.
pub(crate) fn validate_training_set(
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<usize, ForestError> {
    if features.is_empty() {
        return Err(ForestError::EmptyTrainingSet);
    }
    if features.len() != labels.len() {
        return Err(ForestError::LabelCountMismatch {
            n_rows: features.len(),
            n_labels: labels.len(),
        });
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| v.is_infinite()) {
            return Err(ForestError::InfiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

#[cfg(test)]
mod tests {
    use super::{ForestError, validate_training_set};

    #[test]
    fn accepts_nan_cells() {
        let features = vec![vec![1.0, f64::NAN], vec![2.0, 3.0]];
        assert_eq!(validate_training_set(&features, &[0, 1]).unwrap(), 2);
    }

    #[test]
    fn rejects_infinite_cells() {
        let features = vec![vec![1.0, 2.0], vec![f64::NEG_INFINITY, 3.0]];
        let err = validate_training_set(&features, &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::InfiniteValue { sample_index: 1, feature_index: 0 }
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let features = vec![vec![1.0, 2.0], vec![3.0]];
        let err = validate_training_set(&features, &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::FeatureCountMismatch { expected: 2, got: 1, sample_index: 1 }
        ));
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let err = validate_training_set(&[vec![1.0]], &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::LabelCountMismatch { n_rows: 1, n_labels: 2 }
        ));
    }

    #[test]
    fn rejects_zero_feature_rows() {
        let err = validate_training_set(&[vec![]], &[0]).unwrap_err();
        assert!(matches!(err, ForestError::ZeroFeatures));
    }
}
