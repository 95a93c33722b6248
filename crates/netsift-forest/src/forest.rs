//! Random forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::ForestError;
use crate::importance::aggregate_importances;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted random forest ensemble.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

/// Draw a bootstrap sample of `n_samples` row indices with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the random forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, ForestError> {
    let n_features = crate::validate_training_set(features, labels)?;
    let n_samples = features.len();
    let max_features_resolved = config.max_features.resolve(n_features)?;

    let tree_template = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features_resolved));
    tree_template.validate(n_features)?;

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features = max_features_resolved,
        "training random forest"
    );

    // Per-tree seeds are drawn up front so results do not depend on scheduling.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    // Shared column-major view; bootstrap draws index into it.
    let col_features: Vec<Vec<f64>> = (0..n_features)
        .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
        .collect();

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bootstrap_indices = bootstrap_sample(n_samples, &mut rng);
            tree_template
                .clone()
                .with_seed(rng.r#gen())
                .fit_columns(&col_features, labels, &bootstrap_indices, max_features_resolved)
        })
        .collect();

    let per_tree_importances: Vec<Vec<f64>> =
        trees.iter().map(|t| t.feature_importances()).collect();
    let importances = aggregate_importances(&per_tree_importances, feature_names);

    debug!(
        total_nodes = trees.iter().map(DecisionTree::n_nodes).sum::<usize>(),
        "tree training complete"
    );

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
    };

    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved,
    };

    info!("random forest training complete");

    Ok(RandomForestResult::new(forest, importances, metadata))
}

#[cfg(test)]
mod tests {
    use crate::config::{MaxFeatures, RandomForestConfig};

    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            features.push(vec![i as f64 * 0.1, 0.5]);
            labels.push(0);
        }
        for i in 0..30 {
            features.push(vec![10.0 + i as f64 * 0.1, 0.5]);
            labels.push(1);
        }
        let names = vec!["x".to_string(), "y".to_string()];
        (features, labels, names)
    }

    #[test]
    fn separable_training_accuracy() {
        let (features, labels, names) = make_separable_data();
        let result = RandomForestConfig::new(25)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &names)
            .unwrap();
        let predictions = result.forest().predict_batch(&features).unwrap();
        let correct = predictions
            .iter()
            .zip(&labels)
            .filter(|&(&p, &l)| p == l)
            .count();
        assert_eq!(correct, labels.len());
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let (features, labels, names) = make_separable_data();
        let result = RandomForestConfig::new(20)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        let total: f64 = result.importances().iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        assert_eq!(result.importances()[0].name, "x");
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels, names) = make_separable_data();
        let config = RandomForestConfig::new(10).unwrap().with_seed(99);
        let forest1 = config.fit(&features, &labels, &names).unwrap().into_forest();
        let forest2 = config.fit(&features, &labels, &names).unwrap().into_forest();

        let grid: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64 * 0.25, 0.5]).collect();
        assert_eq!(
            forest1.predict_batch(&grid).unwrap(),
            forest2.predict_batch(&grid).unwrap()
        );
    }

    #[test]
    fn metadata_reflects_training_set() {
        let (features, labels, names) = make_separable_data();
        let result = RandomForestConfig::new(3)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        let meta = result.metadata();
        assert_eq!(meta.n_trees, 3);
        assert_eq!(meta.n_samples, 60);
        assert_eq!(meta.n_features, 2);
        assert_eq!(meta.n_classes, 2);
        assert_eq!(meta.max_features_resolved, 1);
    }

    #[test]
    fn empty_training_set_error() {
        let err = RandomForestConfig::new(10)
            .unwrap()
            .fit(&[], &[], &[])
            .unwrap_err();
        assert!(matches!(err, crate::ForestError::EmptyTrainingSet));
    }

    #[test]
    fn invalid_depth_rejected_before_training() {
        let (features, labels, names) = make_separable_data();
        let err = RandomForestConfig::new(10)
            .unwrap()
            .with_max_depth(Some(0))
            .fit(&features, &labels, &names)
            .unwrap_err();
        assert!(matches!(err, crate::ForestError::InvalidMaxDepth { .. }));
    }
}
