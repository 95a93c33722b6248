use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// Returns zero when `n_samples` is zero.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        self.impurity_of(class_counts.iter().copied(), n_samples)
    }

    fn impurity_of(&self, class_counts: impl Iterator<Item = usize>, n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            SplitCriterion::Gini => {
                let sum_sq: f64 = class_counts
                    .map(|c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum();
                1.0 - sum_sq
            }
            SplitCriterion::Entropy => -class_counts
                .filter(|&c| c > 0)
                .map(|c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        };
        Impurity::new(value)
    }

    /// Impurity of the element-wise sum of two count vectors.
    fn merged_impurity(&self, base: &[usize], extra: &[usize], n_samples: usize) -> f64 {
        self.impurity_of(base.iter().zip(extra).map(|(a, b)| a + b), n_samples)
            .value()
    }
}

impl std::fmt::Display for SplitCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SplitCriterion::Gini => "gini",
            SplitCriterion::Entropy => "entropy",
        })
    }
}

/// Best split found for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    pub(crate) missing_left: bool,
    /// Weighted impurity decrease (MDI numerator).
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Candidate tracked while scanning features.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    missing_left: bool,
    decrease: f64,
}

/// Find the best split among a random subset of features.
///
/// Draws features in random order until `max_features` non-constant ones
/// have been scanned (features constant at this node are skipped and do not
/// count). Each scan sorts the present (non-NaN) values, walks left-to-right
/// with incremental class counts, and keeps the split with the largest
/// weighted impurity decrease. Samples whose value is missing are tried on
/// both sides of every candidate threshold.
/// When a feature has no missing values at this node, missing values seen at
/// prediction time follow the larger child.
///
/// Returns `None` when no valid split exists (every feature is constant at
/// this node, or every boundary violates `min_samples_leaf`).
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    criterion: &SplitCriterion,
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_features = features.len();
    let n_samples = sample_indices.len();

    if n_samples == 0 || n_features == 0 {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }
    let parent_impurity = criterion.impurity(&parent_counts, n_samples).value();

    // Lazy Fisher-Yates: each step draws one not-yet-visited feature.
    let mut feature_order: Vec<usize> = (0..n_features).collect();
    let mut n_visited = 0usize;
    let mut best: Option<Candidate> = None;

    for draw in 0..n_features {
        if n_visited == max_features {
            break;
        }
        let j = rng.gen_range(draw..n_features);
        feature_order.swap(draw, j);
        let feat_idx = feature_order[draw];
        let feat_col = &features[feat_idx];

        let mut missing_counts = vec![0usize; n_classes];
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n_samples);
        for &si in sample_indices {
            let v = feat_col[si];
            if v.is_nan() {
                missing_counts[labels[si]] += 1;
            } else {
                sorted.push((v, si));
            }
        }
        let n_missing = n_samples - sorted.len();
        if sorted.len() < 2 {
            continue;
        }
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
        // Constant at this node: draw another feature without using up the budget.
        if sorted[0].0 == sorted[sorted.len() - 1].0 {
            continue;
        }
        n_visited += 1;

        let zeros = vec![0usize; n_classes];
        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts: Vec<usize> = parent_counts
            .iter()
            .zip(&missing_counts)
            .map(|(p, m)| p - m)
            .collect();

        let n_present = sorted.len();
        for i in 0..(n_present - 1) {
            let (val_i, si) = sorted[i];
            let class_i = labels[si];
            left_counts[class_i] += 1;
            right_counts[class_i] -= 1;

            let val_next = sorted[i + 1].0;
            if val_i == val_next {
                continue;
            }

            let n_left_present = i + 1;
            let n_right_present = n_present - n_left_present;

            let sides: &[bool] = if n_missing == 0 {
                if n_left_present >= n_right_present { &[true] } else { &[false] }
            } else {
                &[true, false]
            };

            for &missing_left in sides {
                let (n_left, n_right) = if missing_left {
                    (n_left_present + n_missing, n_right_present)
                } else {
                    (n_left_present, n_right_present + n_missing)
                };
                if n_left < min_samples_leaf || n_right < min_samples_leaf {
                    continue;
                }

                let (left_extra, right_extra) = if missing_left {
                    (&missing_counts, &zeros)
                } else {
                    (&zeros, &missing_counts)
                };
                let left_impurity = criterion.merged_impurity(&left_counts, left_extra, n_left);
                let right_impurity =
                    criterion.merged_impurity(&right_counts, right_extra, n_right);

                let decrease = (n_samples as f64) * parent_impurity
                    - (n_left as f64) * left_impurity
                    - (n_right as f64) * right_impurity;

                if best.is_none_or(|b| decrease > b.decrease) {
                    let mut threshold = (val_i + val_next) / 2.0;
                    // Adjacent floats can round the midpoint up to `val_next`.
                    if threshold >= val_next {
                        threshold = val_i;
                    }
                    best = Some(Candidate {
                        feature: feat_idx,
                        threshold,
                        missing_left,
                        decrease,
                    });
                }
            }
        }
    }

    let best = best?;

    let feat_col = &features[best.feature];
    let mut left_indices = Vec::with_capacity(n_samples / 2);
    let mut right_indices = Vec::with_capacity(n_samples / 2);
    for &si in sample_indices {
        let v = feat_col[si];
        let goes_left = if v.is_nan() {
            best.missing_left
        } else {
            v <= best.threshold
        };
        if goes_left {
            left_indices.push(si);
        } else {
            right_indices.push(si);
        }
    }

    Some(SplitResult {
        feature: FeatureIndex::new(best.feature),
        threshold: best.threshold,
        missing_left: best.missing_left,
        impurity_decrease: best.decrease,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{SplitCriterion, find_best_split};

    fn split_one_feature(
        column: Vec<f64>,
        labels: &[usize],
        min_samples_leaf: usize,
    ) -> Option<super::SplitResult> {
        let features = vec![column];
        let sample_indices: Vec<usize> = (0..labels.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        find_best_split(
            &features,
            labels,
            &sample_indices,
            2,
            &SplitCriterion::Gini,
            1,
            min_samples_leaf,
            &mut rng,
        )
    }

    #[test]
    fn gini_pure() {
        let imp = SplitCriterion::Gini.impurity(&[10, 0], 10);
        assert!(imp.value().abs() < f64::EPSILON);
    }

    #[test]
    fn gini_binary_balanced() {
        let imp = SplitCriterion::Gini.impurity(&[5, 5], 10);
        assert!((imp.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn entropy_binary_balanced() {
        let imp = SplitCriterion::Entropy.impurity(&[5, 5], 10);
        assert!((imp.value() - 2.0_f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn empty_node_has_zero_impurity() {
        assert_eq!(SplitCriterion::Gini.impurity(&[0, 0], 0).value(), 0.0);
    }

    #[test]
    fn separable_data_finds_correct_split() {
        let labels = [0, 0, 0, 1, 1, 1];
        let split = split_one_feature(vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0], &labels, 1)
            .expect("should find a split");
        assert_eq!(split.feature.index(), 0);
        assert!(split.threshold > 3.0 && split.threshold < 10.0);
        assert_eq!(split.left_indices, vec![0, 1, 2]);
        assert_eq!(split.right_indices, vec![3, 4, 5]);
    }

    #[test]
    fn constant_feature_returns_none() {
        let labels = [0, 0, 1, 1];
        assert!(split_one_feature(vec![5.0; 4], &labels, 1).is_none());
    }

    #[test]
    fn min_samples_leaf_enforced() {
        let labels = [0, 1];
        assert!(split_one_feature(vec![1.0, 10.0], &labels, 2).is_none());
    }

    #[test]
    fn missing_values_join_the_matching_side() {
        // The two NaN samples are class 1, so they belong with the high values.
        let labels = [0, 0, 0, 1, 1, 1, 1, 1];
        let column = vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0, f64::NAN, f64::NAN];
        let split = split_one_feature(column, &labels, 1).expect("should find a split");
        assert!(!split.missing_left);
        assert_eq!(split.left_indices, vec![0, 1, 2]);
        assert_eq!(split.right_indices, vec![3, 4, 5, 6, 7]);
        assert!((split.impurity_decrease - 8.0 * (1.0 - (9.0 + 25.0) / 64.0)).abs() < 1e-10);
    }

    #[test]
    fn all_missing_feature_returns_none() {
        let labels = [0, 1, 0];
        assert!(split_one_feature(vec![f64::NAN; 3], &labels, 1).is_none());
    }
}
