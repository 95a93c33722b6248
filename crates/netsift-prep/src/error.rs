/// Errors from encoding, splitting, and scaling.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Returned under the reject policy when a categorical value is not in
    /// its column's vocabulary.
    #[error("row {row_index}, column {column}: unknown category \"{value}\"")]
    UnknownCategory {
        /// Zero-based row index.
        row_index: usize,
        /// Schema name of the column.
        column: &'static str,
        /// The unrecognized value.
        value: String,
    },

    /// Returned when the test ratio is not strictly between 0 and 1.
    #[error("test ratio must be in (0, 1), got {ratio}")]
    InvalidTestRatio {
        /// The rejected ratio.
        ratio: f64,
    },

    /// Returned when a split would leave the train or test subset empty.
    #[error("splitting {n_rows} rows with {n_test} test rows leaves an empty subset")]
    DegenerateSplit {
        /// Number of rows available.
        n_rows: usize,
        /// Number of rows the ratio assigns to the test subset.
        n_test: usize,
    },

    /// Returned when a scaler is fit on zero rows.
    #[error("cannot fit a scaler on an empty matrix")]
    EmptyMatrix,

    /// Returned when a matrix has a different width than the fitted scaler.
    #[error("matrix has {got} feature columns, scaler was fit on {expected}")]
    FeatureCountMismatch {
        /// Width the scaler was fit on.
        expected: usize,
        /// Width of the offending matrix.
        got: usize,
    },
}
