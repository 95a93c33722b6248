//! Headerless CSV loader for traffic records with schema validation.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::record::{Dataset, Field, TrafficRecord};
use crate::schema::{ColumnKind, FIELD_COUNT, N_FEATURES, SCHEMA};

/// Reads traffic records from a comma-delimited file.
///
/// Expected format:
/// - No header row
/// - 42 fields per row: the 41 schema features in order, then the label
/// - Numeric columns hold finite floats; categorical columns and the label are
///   free text (surrounding whitespace is trimmed)
/// - Blank lines are skipped
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::SourceUnreadable`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::SchemaMismatch`] | Row has a field count other than 42 |
/// | [`IoError::MalformedNumber`] | Numeric cell is NaN, Inf, or unparseable |
/// | [`IoError::EmptyDataset`] | Zero data rows |
pub struct DatasetLoader {
    path: PathBuf,
}

impl DatasetLoader {
    /// Create a new loader for the given file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Open and load the file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::SourceUnreadable {
            path: self.path.clone(),
            source: e,
        })?;
        Self::read_from(file)
    }

    /// Load records from any byte stream.
    pub fn read_from<R: Read>(reader: R) -> Result<Dataset, IoError> {
        // flexible(true) so our SchemaMismatch fires instead of a generic CsvParse.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| IoError::CsvParse {
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if row.len() != FIELD_COUNT {
                return Err(IoError::SchemaMismatch {
                    row_index,
                    expected: FIELD_COUNT,
                    got: row.len(),
                });
            }

            let mut fields = Vec::with_capacity(N_FEATURES);
            for (column, raw) in SCHEMA.iter().zip(row.iter()) {
                let field = match column.kind {
                    ColumnKind::Categorical => Field::Categorical(raw.to_string()),
                    ColumnKind::Numeric => Field::Numeric(parse_finite(raw).ok_or_else(|| {
                        IoError::MalformedNumber {
                            row_index,
                            column: column.name,
                            raw: raw.to_string(),
                        }
                    })?),
                };
                fields.push(field);
            }
            let label = row.get(N_FEATURES).unwrap_or_default().to_string();
            records.push(TrafficRecord::new(fields, label));
        }

        if records.is_empty() {
            return Err(IoError::EmptyDataset);
        }

        let n_normal = records.iter().filter(|r| r.label() == "normal.").count();
        debug!(n_normal, "label census");
        info!(n_records = records.len(), "dataset loaded");

        Ok(Dataset::new(records))
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
