//! The persisted evaluation record and the sink boundary that stores it.
//!
//! The record uses its own plain serde types so that this crate has no
//! dependency on the preprocessing or forest crates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::IoError;
use crate::record::DatasetId;

/// Stores the outcome of one successful pipeline run.
///
/// Implementations overwrite any prior record for the same dataset id.
pub trait ResultSink: Send + Sync {
    /// Persist `record`, replacing any earlier record for its dataset id.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError`] when the record cannot be written.
    fn store(&self, record: &ResultRecord) -> Result<(), IoError>;
}

impl<S: ResultSink + ?Sized> ResultSink for std::sync::Arc<S> {
    fn store(&self, record: &ResultRecord) -> Result<(), IoError> {
        (**self).store(record)
    }
}

/// Everything that outlives a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Dataset the record belongs to.
    pub dataset_id: String,
    /// Fraction of correctly classified test rows.
    pub accuracy: f64,
    /// Human-readable classification report.
    pub report: String,
    /// Always true for a stored record.
    pub processed: bool,
    /// When the run finished.
    pub created_at: DateTime<Utc>,
    /// Structured form of `report`.
    pub evaluation: EvaluationRecord,
    /// Category vocabularies used to encode this dataset, in canonical order.
    pub vocabularies: Vec<VocabularyRecord>,
    /// Unknown-category handling outcome.
    pub encoding: EncodingRecord,
    /// Parameters the run was configured with.
    pub parameters: RunParameters,
}

impl ResultRecord {
    /// Return the dataset id as a validated [`DatasetId`].
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidDatasetId`] if the stored id is malformed.
    pub fn id(&self) -> Result<DatasetId, IoError> {
        DatasetId::new(self.dataset_id.clone())
    }
}

/// Precision, recall, F1 and support for one class or one average row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Class name or average name.
    pub name: String,
    /// Precision.
    pub precision: f64,
    /// Recall.
    pub recall: f64,
    /// F1 score.
    pub f1: f64,
    /// Number of true rows counted.
    pub support: usize,
}

/// A feature and its normalized mean-decrease-in-impurity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Feature column name.
    pub name: String,
    /// Normalized importance.
    pub importance: f64,
    /// 1-based rank.
    pub rank: usize,
}

/// Structured evaluation metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Overall accuracy.
    pub accuracy: f64,
    /// Per-class scores in class-index order.
    pub classes: Vec<ScoreRecord>,
    /// Unweighted mean of the class scores.
    pub macro_avg: ScoreRecord,
    /// Support-weighted mean of the class scores.
    pub weighted_avg: ScoreRecord,
    /// `confusion_matrix[true][predicted]` counts.
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Ranked feature importances of the trained forest.
    pub feature_importances: Vec<FeatureRecord>,
}

/// One category vocabulary in canonical (sorted by value) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyRecord {
    /// Schema column the vocabulary encodes.
    pub column: String,
    /// True when the vocabulary was built from the dataset itself.
    pub derived: bool,
    /// `value → code` pairs sorted by value.
    pub entries: Vec<(String, u32)>,
}

/// How out-of-vocabulary categorical values were handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingRecord {
    /// Policy name (`missing`, `reject`, or `other`).
    pub unknown_category_policy: String,
    /// Count of unknown cells per column; columns with zero are omitted.
    pub unknown_counts: BTreeMap<String, usize>,
}

/// Run configuration and partition sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Seed shared by the splitter and the forest.
    pub seed: u64,
    /// Fraction of rows held out for evaluation.
    pub test_ratio: f64,
    /// Number of trees.
    pub n_trees: usize,
    /// Feature subsampling strategy.
    pub max_features: String,
    /// Depth limit, if any.
    pub max_depth: Option<usize>,
    /// Minimum samples to split a node.
    pub min_samples_split: usize,
    /// Minimum samples per leaf.
    pub min_samples_leaf: usize,
    /// Split criterion name.
    pub criterion: String,
    /// Number of loaded rows.
    pub n_rows: usize,
    /// Number of training rows.
    pub n_train: usize,
    /// Number of test rows.
    pub n_test: usize,
}
