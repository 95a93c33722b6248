use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{instrument, trace};

use crate::{
    ForestError,
    node::{Node, NodeIndex},
    split::{SplitCriterion, find_best_split},
};

/// Configuration for a single CART decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the maximum tree depth (root is depth 0). `None` means unlimited.
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

    /// Set the number of features considered at each split. `None` means all.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed used for feature subsampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train a decision tree on the provided row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]`, with NaN marking a missing value.
    /// `labels[sample_idx]` are zero-based class labels.
    ///
    /// # Errors
    ///
    /// | Variant                                  | When                                            |
    /// |------------------------------------------|-------------------------------------------------|
    /// | [`ForestError::EmptyTrainingSet`]        | `features` is empty                             |
    /// | [`ForestError::ZeroFeatures`]            | rows have zero feature columns                  |
    /// | [`ForestError::LabelCountMismatch`]      | `labels.len() != features.len()`                |
    /// | [`ForestError::FeatureCountMismatch`]    | rows have inconsistent lengths                  |
    /// | [`ForestError::InfiniteValue`]           | any value is infinite                           |
    /// | [`ForestError::InvalidMaxFeatures`]      | `max_features` outside [1, n_features]          |
    /// | [`ForestError::InvalidMaxDepth`]         | `max_depth` is `Some(0)`                        |
    /// | [`ForestError::InvalidMinSamplesSplit`]  | `min_samples_split` < 2                         |
    /// | [`ForestError::InvalidMinSamplesLeaf`]   | `min_samples_leaf` < 1                          |
    #[instrument(skip(self, features, labels), fields(n_samples = features.len()))]
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<DecisionTree, ForestError> {
        let n_features = crate::validate_training_set(features, labels)?;
        self.validate(n_features)?;
        let max_features = self.max_features.unwrap_or(n_features);

        // Column-major copy for the split scan.
        let col_features: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();

        let sample_indices: Vec<usize> = (0..features.len()).collect();
        Ok(self.fit_columns(&col_features, labels, &sample_indices, max_features))
    }

    pub(crate) fn validate(&self, n_features: usize) -> Result<(), ForestError> {
        if let Some(d) = self.max_depth
            && d == 0
        {
            return Err(ForestError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(ForestError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(ForestError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(ForestError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(())
    }

    /// Grow a tree over `sample_indices` of pre-validated column-major data.
    ///
    /// `sample_indices` may repeat entries (bootstrap draws).
    pub(crate) fn fit_columns(
        &self,
        col_features: &[Vec<f64>],
        labels: &[usize],
        sample_indices: &[usize],
        max_features: usize,
    ) -> DecisionTree {
        let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut builder = TreeBuilder {
            col_features,
            labels,
            n_classes,
            config: self,
            max_features,
            rng: &mut rng,
            arena: Vec::new(),
        };
        builder.grow(sample_indices, 0);

        trace!(n_nodes = builder.arena.len(), "decision tree built");

        DecisionTree {
            nodes: builder.arena,
            n_features: col_features.len(),
            n_classes,
        }
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursive growth state for one tree.
struct TreeBuilder<'a> {
    col_features: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    config: &'a DecisionTreeConfig,
    max_features: usize,
    rng: &'a mut ChaCha8Rng,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Build the subtree for `sample_indices` and return its arena index.
    fn grow(&mut self, sample_indices: &[usize], depth: usize) -> NodeIndex {
        let n_samples = sample_indices.len();

        let mut class_counts = vec![0usize; self.n_classes];
        for &si in sample_indices {
            class_counts[self.labels[si]] += 1;
        }
        let impurity = self.config.criterion.impurity(&class_counts, n_samples);

        let depth_exceeded = self.config.max_depth.is_some_and(|max_d| depth >= max_d);
        let too_few = n_samples < self.config.min_samples_split;
        let pure = impurity.value() == 0.0;

        let split = if too_few || pure || depth_exceeded {
            None
        } else {
            find_best_split(
                self.col_features,
                self.labels,
                sample_indices,
                self.n_classes,
                &self.config.criterion,
                self.max_features,
                self.config.min_samples_leaf,
                &mut *self.rng,
            )
        };

        let Some(split) = split else {
            // Ties resolve to the lowest class index.
            let prediction = class_counts
                .iter()
                .enumerate()
                .fold((0, 0), |best, (class, &count)| {
                    if count > best.1 { (class, count) } else { best }
                })
                .0;
            self.arena.push(Node::Leaf {
                prediction,
                impurity,
                n_samples,
            });
            return NodeIndex::new(self.arena.len() - 1);
        };

        // Reserve the slot, grow children, then overwrite with the split.
        let node_idx = self.arena.len();
        self.arena.push(Node::Leaf {
            prediction: 0,
            impurity,
            n_samples,
        });

        let left = self.grow(&split.left_indices, depth + 1);
        let right = self.grow(&split.right_indices, depth + 1);

        self.arena[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            missing_left: split.missing_left,
            left,
            right,
            impurity,
            n_samples,
            impurity_decrease: split.impurity_decrease,
        };

        NodeIndex::new(node_idx)
    }
}

/// A fitted CART decision tree stored as a node arena rooted at index 0.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the class label for a single sample.
    ///
    /// At each split, goes left when `sample[feature] <= threshold`, right
    /// otherwise; a NaN value follows the split's recorded missing side.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, ForestError> {
        if sample.len() != self.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(self.leaf_class(sample))
    }

    /// Compute Mean Decrease in Impurity (MDI) feature importances.
    ///
    /// Normalized to sum to 1.0; all zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the number of classes seen during training.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the total number of nodes in the tree.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree. A lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node_idx, d)) = stack.pop() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        max_depth
    }

    /// Walk from the root to a leaf; `sample` length is already checked.
    pub(crate) fn leaf_class(&self, sample: &[f64]) -> usize {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { prediction, .. } => return *prediction,
                Node::Split {
                    feature,
                    threshold,
                    missing_left,
                    left,
                    right,
                    ..
                } => {
                    let v = sample[feature.index()];
                    let goes_left = if v.is_nan() { *missing_left } else { v <= *threshold };
                    idx = if goes_left { left.index() } else { right.index() };
                }
            }
        }
    }
}
