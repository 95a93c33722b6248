/// Marker for a missing numeric cell.
pub const MISSING: f64 = f64::NAN;

/// Encoded features and binary labels for a set of records.
///
/// `features[row][column]` follows schema column order; `labels[row]` is 0
/// for normal traffic and 1 for an attack. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMatrix {
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
    feature_names: Vec<String>,
}

impl EncodedMatrix {
    pub(crate) fn new(features: Vec<Vec<f64>>, labels: Vec<usize>, feature_names: Vec<String>) -> Self {
        debug_assert_eq!(features.len(), labels.len());
        Self {
            features,
            labels,
            feature_names,
        }
    }

    /// Return the feature rows.
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the labels, one per row.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Build a new matrix from the given rows, in the given order.
    pub(crate) fn select(&self, rows: &[usize]) -> Self {
        Self {
            features: rows.iter().map(|&r| self.features[r].clone()).collect(),
            labels: rows.iter().map(|&r| self.labels[r]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Build a matrix with the same labels and names but new feature rows.
    pub(crate) fn with_features(&self, features: Vec<Vec<f64>>) -> Self {
        Self {
            features,
            labels: self.labels.clone(),
            feature_names: self.feature_names.clone(),
        }
    }
}
