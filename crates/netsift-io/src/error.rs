//! I/O error types for netsift-io.

use std::path::PathBuf;

/// Errors from dataset loading, identifier validation, and result storage.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("cannot read dataset source {path}")]
    SourceUnreadable {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error at byte offset {offset}")]
    CsvParse {
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a row does not have exactly one field per schema column.
    #[error("row {row_index} has {got} fields, expected {expected}")]
    SchemaMismatch {
        /// Zero-based row index.
        row_index: usize,
        /// Expected number of fields (41 features plus the label).
        expected: usize,
        /// Actual number of fields in this row.
        got: usize,
    },

    /// Returned when a numeric cell is not a finite float.
    #[error("row {row_index}, column {column}: \"{raw}\" is not a finite number")]
    MalformedNumber {
        /// Zero-based row index.
        row_index: usize,
        /// Schema name of the offending column.
        column: &'static str,
        /// The raw text that failed to parse.
        raw: String,
    },

    /// Returned when the source contains zero data rows.
    #[error("dataset has no data rows")]
    EmptyDataset,

    /// Returned when a dataset id contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid dataset id \"{id}\": must match [a-zA-Z0-9_-]+")]
    InvalidDatasetId {
        /// The invalid id.
        id: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result record cannot be encoded as JSON.
    #[error("cannot encode result record for {id}")]
    Encode {
        /// Dataset id of the record.
        id: String,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },

    /// Returned when a result file cannot be written or moved into place.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when no stored result exists or it cannot be read.
    #[error("cannot read result file {path}")]
    ReadResult {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a stored result is not a valid record.
    #[error("stored result {path} is not a valid record")]
    DecodeResult {
        /// Path of the stored file.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },
}
