//! Category vocabularies: string value to integer code.

use std::collections::HashMap;

/// `protocol_type` values in code order.
pub const PROTOCOL_TYPES: [&str; 3] = ["tcp", "udp", "icmp"];

/// `flag` values in code order.
pub const FLAGS: [&str; 10] = ["SF", "S0", "REJ", "RSTR", "RSTO", "SH", "S1", "S2", "S3", "OTH"];

/// Whether a vocabulary is a constant table or built from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularyKind {
    /// A constant mapping shared by every dataset.
    Fixed,
    /// Built from first-occurrence order in the dataset being encoded.
    Derived,
}

/// A bijection between category strings and consecutive codes `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVocabulary {
    column: &'static str,
    kind: VocabularyKind,
    values: Vec<String>,
    codes: HashMap<String, u32>,
}

impl CategoryVocabulary {
    /// Build a fixed vocabulary; `values[i]` gets code `i`.
    #[must_use]
    pub fn fixed(column: &'static str, values: &[&str]) -> Self {
        let mut vocab = Self::empty(column, VocabularyKind::Fixed);
        for v in values {
            vocab.insert(v);
        }
        vocab
    }

    /// Build a derived vocabulary from values in scan order.
    ///
    /// Each distinct value gets the next code the first time it is seen.
    #[must_use]
    pub fn derive<'a>(column: &'static str, values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vocab = Self::empty(column, VocabularyKind::Derived);
        for v in values {
            vocab.insert(v);
        }
        vocab
    }

    fn empty(column: &'static str, kind: VocabularyKind) -> Self {
        Self {
            column,
            kind,
            values: Vec::new(),
            codes: HashMap::new(),
        }
    }

    fn insert(&mut self, value: &str) {
        if !self.codes.contains_key(value) {
            let code = self.values.len() as u32;
            self.codes.insert(value.to_string(), code);
            self.values.push(value.to_string());
        }
    }

    /// Return the code for `value`, if it is in the vocabulary.
    #[must_use]
    pub fn code(&self, value: &str) -> Option<u32> {
        self.codes.get(value).copied()
    }

    /// Return the value with code `code`.
    #[must_use]
    pub fn value(&self, code: u32) -> Option<&str> {
        self.values.get(code as usize).map(String::as_str)
    }

    /// Return the schema column this vocabulary encodes.
    #[must_use]
    pub fn column(&self) -> &'static str {
        self.column
    }

    /// Return whether the vocabulary is fixed or derived.
    #[must_use]
    pub fn kind(&self) -> VocabularyKind {
        self.kind
    }

    /// Return the number of known values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return true if no values are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(value, code)` pairs in code order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> {
        self.values
            .iter()
            .enumerate()
            .map(|(code, v)| (v.as_str(), code as u32))
    }

    /// Return `(value, code)` pairs sorted by value.
    ///
    /// The sorted form is independent of scan order, so two runs that saw the
    /// same values in different orders can be compared entry by entry.
    #[must_use]
    pub fn canonical(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self.entries().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// The vocabularies used to encode one dataset, in schema column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabularies {
    pub(crate) by_column: Vec<(usize, CategoryVocabulary)>,
}

impl Vocabularies {
    /// Return the vocabulary for a schema column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&CategoryVocabulary> {
        self.iter().find(|v| v.column() == column)
    }

    pub(crate) fn for_index(&self, index: usize) -> Option<&CategoryVocabulary> {
        self.by_column
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, v)| v)
    }

    /// Iterate vocabularies in schema column order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryVocabulary> {
        self.by_column.iter().map(|(_, v)| v)
    }
}
