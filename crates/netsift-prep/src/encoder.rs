//! Categorical and label encoding for traffic records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use netsift_io::Dataset;
use netsift_io::Field;
use netsift_io::schema::{self, ColumnKind, SCHEMA};
use tracing::{debug, info, instrument, warn};

use crate::error::PrepError;
use crate::matrix::{EncodedMatrix, MISSING};
use crate::vocabulary::{CategoryVocabulary, FLAGS, PROTOCOL_TYPES, Vocabularies};

/// The only raw label that marks normal traffic.
pub const NORMAL_LABEL: &str = "normal.";

/// Display names for encoded labels 0 and 1.
pub const CLASS_NAMES: [&str; 2] = ["normal", "attack"];

/// Map a raw label to 0 (normal) or 1 (attack). Case-sensitive.
#[must_use]
pub fn encode_label(raw: &str) -> usize {
    usize::from(raw != NORMAL_LABEL)
}

/// What to do with a categorical value missing from a fixed vocabulary.
///
/// The `Display` form is the name stored in result records and accepted by
/// `FromStr`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownCategoryPolicy {
    /// Encode the cell as [`MISSING`] and log a warning with per-column counts.
    #[default]
    Missing,
    /// Fail encoding with [`PrepError::UnknownCategory`].
    Reject,
    /// Encode the cell as a reserved code equal to the vocabulary size.
    OtherBucket,
}

impl fmt::Display for UnknownCategoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnknownCategoryPolicy::Missing => "missing",
            UnknownCategoryPolicy::Reject => "reject",
            UnknownCategoryPolicy::OtherBucket => "other",
        })
    }
}

impl FromStr for UnknownCategoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missing" => Ok(UnknownCategoryPolicy::Missing),
            "reject" => Ok(UnknownCategoryPolicy::Reject),
            "other" => Ok(UnknownCategoryPolicy::OtherBucket),
            other => Err(format!(
                "unknown category policy \"{other}\" (expected missing, reject, or other)"
            )),
        }
    }
}

/// Counts of out-of-vocabulary cells seen while encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingSummary {
    policy: UnknownCategoryPolicy,
    unknown_counts: BTreeMap<&'static str, usize>,
}

impl EncodingSummary {
    /// Return the policy that was applied.
    #[must_use]
    pub fn policy(&self) -> UnknownCategoryPolicy {
        self.policy
    }

    /// Return unknown-cell counts per column; columns with none are absent.
    #[must_use]
    pub fn unknown_counts(&self) -> &BTreeMap<&'static str, usize> {
        &self.unknown_counts
    }

    /// Return the total number of unknown cells.
    #[must_use]
    pub fn total_unknown(&self) -> usize {
        self.unknown_counts.values().sum()
    }
}

/// Output of [`FeatureEncoder::encode`].
#[derive(Debug, Clone)]
pub struct Encoded {
    /// The numeric matrix and labels.
    pub matrix: EncodedMatrix,
    /// Vocabularies used for each categorical column.
    pub vocabularies: Vocabularies,
    /// Unknown-category outcome.
    pub summary: EncodingSummary,
}

/// Converts a [`Dataset`] into an [`EncodedMatrix`].
///
/// `protocol_type` and `flag` use fixed vocabularies; every other categorical
/// column (only `service` in the schema) gets a vocabulary derived from the
/// dataset in first-occurrence order. Numeric columns pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder {
    policy: UnknownCategoryPolicy,
}

impl FeatureEncoder {
    /// Create an encoder with the given unknown-category policy.
    #[must_use]
    pub fn new(policy: UnknownCategoryPolicy) -> Self {
        Self { policy }
    }

    /// Return the unknown-category policy.
    #[must_use]
    pub fn policy(&self) -> UnknownCategoryPolicy {
        self.policy
    }

    /// Encode every record of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::UnknownCategory`] under
    /// [`UnknownCategoryPolicy::Reject`] when a fixed vocabulary lacks a value.
    #[instrument(skip_all, fields(n_records = dataset.len(), policy = %self.policy))]
    pub fn encode(&self, dataset: &Dataset) -> Result<Encoded, PrepError> {
        let vocabularies = build_vocabularies(dataset);
        for vocab in vocabularies.iter() {
            debug!(column = vocab.column(), n_values = vocab.len(), "vocabulary ready");
        }

        let mut unknown_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut features = Vec::with_capacity(dataset.len());
        let mut labels = Vec::with_capacity(dataset.len());

        for (row_index, record) in dataset.records().iter().enumerate() {
            let mut row = Vec::with_capacity(schema::N_FEATURES);
            for (col, field) in record.fields().iter().enumerate() {
                let value = match field {
                    Field::Numeric(v) => *v,
                    Field::Categorical(raw) => {
                        let Some(vocab) = vocabularies.for_index(col) else {
                            // Categorical cell in a numeric column; cannot come from the loader.
                            row.push(MISSING);
                            continue;
                        };
                        match vocab.code(raw) {
                            Some(code) => f64::from(code),
                            None => {
                                let column = vocab.column();
                                match self.policy {
                                    UnknownCategoryPolicy::Reject => {
                                        return Err(PrepError::UnknownCategory {
                                            row_index,
                                            column,
                                            value: raw.clone(),
                                        });
                                    }
                                    UnknownCategoryPolicy::Missing => {
                                        *unknown_counts.entry(column).or_default() += 1;
                                        MISSING
                                    }
                                    UnknownCategoryPolicy::OtherBucket => {
                                        *unknown_counts.entry(column).or_default() += 1;
                                        vocab.len() as f64
                                    }
                                }
                            }
                        }
                    }
                };
                row.push(value);
            }
            features.push(row);
            labels.push(encode_label(record.label()));
        }

        for (column, count) in &unknown_counts {
            warn!(column, count, policy = %self.policy, "unknown category values");
        }

        let n_attack = labels.iter().sum::<usize>();
        info!(
            n_rows = labels.len(),
            n_attack,
            n_normal = labels.len() - n_attack,
            "dataset encoded"
        );

        Ok(Encoded {
            matrix: EncodedMatrix::new(features, labels, schema::feature_names()),
            vocabularies,
            summary: EncodingSummary {
                policy: self.policy,
                unknown_counts,
            },
        })
    }
}

fn build_vocabularies(dataset: &Dataset) -> Vocabularies {
    let by_column = SCHEMA
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == ColumnKind::Categorical)
        .map(|(index, column)| {
            let vocab = match index {
                schema::PROTOCOL_TYPE => CategoryVocabulary::fixed(column.name, &PROTOCOL_TYPES),
                schema::FLAG => CategoryVocabulary::fixed(column.name, &FLAGS),
                _ => CategoryVocabulary::derive(
                    column.name,
                    dataset
                        .records()
                        .iter()
                        .filter_map(|r| r.field(index).and_then(Field::as_categorical)),
                ),
            };
            (index, vocab)
        })
        .collect();
    Vocabularies { by_column }
}
