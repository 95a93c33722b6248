//! Domain types for netsift-io.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::IoError;
use crate::schema::{N_FEATURES, SCHEMA};

/// One typed feature cell of a traffic record.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A parsed numeric value.
    Numeric(f64),
    /// A raw categorical value (trimmed).
    Categorical(String),
}

impl Field {
    /// Return the numeric value, if this is a numeric cell.
    #[must_use]
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Field::Numeric(v) => Some(*v),
            Field::Categorical(_) => None,
        }
    }

    /// Return the category string, if this is a categorical cell.
    #[must_use]
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Field::Numeric(_) => None,
            Field::Categorical(s) => Some(s),
        }
    }
}

/// A single labeled network connection record.
///
/// Holds exactly one [`Field`] per schema column, in schema order, plus the
/// raw label string. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficRecord {
    fields: Vec<Field>,
    label: String,
}

impl TrafficRecord {
    pub(crate) fn new(fields: Vec<Field>, label: String) -> Self {
        debug_assert_eq!(fields.len(), N_FEATURES);
        Self { fields, label }
    }

    /// Return all feature cells in schema order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Return the feature cell at `index`, if it exists.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Look up a feature cell by schema column name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        SCHEMA
            .iter()
            .position(|c| c.name == name)
            .and_then(|i| self.fields.get(i))
    }

    /// Return the raw label string, e.g. `"normal."` or `"smurf."`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// An ordered sequence of traffic records sharing the fixed schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<TrafficRecord>,
}

impl Dataset {
    pub(crate) fn new(records: Vec<TrafficRecord>) -> Self {
        Self { records }
    }

    /// Return the records in file order.
    #[must_use]
    pub fn records(&self) -> &[TrafficRecord] {
        &self.records
    }

    /// Return the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Return true if the dataset has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A validated dataset identifier, used to key stored results.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(String);

impl DatasetId {
    /// Parse and validate a dataset id.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidDatasetId`] if the id is empty or contains
    /// characters outside `[a-zA-Z0-9_-]`.
    pub fn new(id: impl Into<String>) -> Result<Self, IoError> {
        let id = id.into();
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidDatasetId { id });
        }
        Ok(Self(id))
    }

    /// Return the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DatasetId {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A dataset to process: its id and where its rows live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRef {
    id: DatasetId,
    path: PathBuf,
}

impl DatasetRef {
    /// Pair a dataset id with the path of its delimited file.
    #[must_use]
    pub fn new(id: DatasetId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    /// Return the dataset id.
    #[must_use]
    pub fn id(&self) -> &DatasetId {
        &self.id
    }

    /// Return the path of the source file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
