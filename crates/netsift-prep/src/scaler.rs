//! Feature standardization fit on training rows only.

use tracing::{debug, instrument, warn};

use crate::error::PrepError;
use crate::matrix::EncodedMatrix;

/// Fits a [`ScalerState`] from a training matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scaler;

/// Per-column mean and standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalerState {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl Scaler {
    /// Compute per-column statistics over `train`, ignoring missing cells.
    ///
    /// Uses population standard deviation (divides by n, not n-1). A column
    /// with zero variance, or with no present values, gets std = 1 so it is
    /// shifted but not divided.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::EmptyMatrix`] if `train` has no rows.
    #[instrument(skip_all, fields(n_rows = train.n_rows(), n_features = train.n_features()))]
    pub fn fit(train: &EncodedMatrix) -> Result<ScalerState, PrepError> {
        if train.n_rows() == 0 {
            return Err(PrepError::EmptyMatrix);
        }
        let n_features = train.n_features();
        let mut means = Vec::with_capacity(n_features);
        let mut stds = Vec::with_capacity(n_features);
        let mut constant = Vec::new();

        for col in 0..n_features {
            let present = train
                .features()
                .iter()
                .map(|row| row[col])
                .filter(|v| !v.is_nan());
            let (count, sum) = present.clone().fold((0usize, 0.0f64), |(c, s), v| (c + 1, s + v));
            if count == 0 {
                means.push(0.0);
                stds.push(1.0);
                constant.push(col);
                continue;
            }
            let mean = sum / count as f64;
            let variance = present.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
            let std = variance.sqrt();
            means.push(mean);
            if std == 0.0 {
                stds.push(1.0);
                constant.push(col);
            } else {
                stds.push(std);
            }
        }

        if !constant.is_empty() {
            let names: Vec<&str> = constant
                .iter()
                .map(|&c| train.feature_names()[c].as_str())
                .collect();
            warn!(columns = ?names, "zero-variance columns are shifted but not scaled");
        }
        debug!("scaler fitted");
        Ok(ScalerState { means, stds })
    }
}

impl ScalerState {
    /// Map every present cell to `(v - mean) / std`; missing cells stay missing.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::FeatureCountMismatch`] if `matrix` has a different
    /// width than the matrix the state was fit on.
    pub fn transform(&self, matrix: &EncodedMatrix) -> Result<EncodedMatrix, PrepError> {
        if matrix.n_features() != self.means.len() {
            return Err(PrepError::FeatureCountMismatch {
                expected: self.means.len(),
                got: matrix.n_features(),
            });
        }
        let features = matrix
            .features()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.stds))
                    .map(|(&v, (&mean, &std))| (v - mean) / std)
                    .collect()
            })
            .collect();
        Ok(matrix.with_features(features))
    }

    /// Return the per-column means.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Return the per-column standard deviations (1.0 for constant columns).
    #[must_use]
    pub fn stds(&self) -> &[f64] {
        &self.stds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MISSING;

    fn matrix(rows: Vec<Vec<f64>>) -> EncodedMatrix {
        let n_features = rows[0].len();
        let labels = vec![0; rows.len()];
        let names = (0..n_features).map(|i| format!("f{i}")).collect();
        EncodedMatrix::new(rows, labels, names)
    }

    fn column_stats(m: &EncodedMatrix, col: usize) -> (f64, f64) {
        let values: Vec<f64> = m.features().iter().map(|r| r[col]).collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }

    #[test]
    fn train_columns_become_standard() {
        let train = matrix(vec![
            vec![1.0, 100.0],
            vec![2.0, 250.0],
            vec![3.0, 175.0],
            vec![10.0, 0.0],
        ]);
        let state = Scaler::fit(&train).unwrap();
        let scaled = state.transform(&train).unwrap();
        for col in 0..2 {
            let (mean, std) = column_stats(&scaled, col);
            assert!(mean.abs() < 1e-6, "col {col} mean {mean}");
            assert!((std - 1.0).abs() < 1e-6, "col {col} std {std}");
        }
        assert_eq!(scaled.labels(), train.labels());
    }

    #[test]
    fn population_std() {
        let state = Scaler::fit(&matrix(vec![vec![2.0], vec![4.0]])).unwrap();
        assert_eq!(state.means(), &[3.0]);
        assert_eq!(state.stds(), &[1.0]);
    }

    #[test]
    fn zero_variance_column_is_shifted_only() {
        let train = matrix(vec![vec![5.0, 1.0], vec![5.0, 2.0]]);
        let state = Scaler::fit(&train).unwrap();
        assert_eq!(state.stds()[0], 1.0);
        let test = matrix(vec![vec![7.0, 1.5]]);
        let scaled = state.transform(&test).unwrap();
        assert_eq!(scaled.features()[0][0], 2.0);
        assert!(scaled.features()[0].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn missing_cells_are_ignored_and_preserved() {
        let train = matrix(vec![vec![1.0], vec![MISSING], vec![3.0]]);
        let state = Scaler::fit(&train).unwrap();
        assert_eq!(state.means(), &[2.0]);
        assert_eq!(state.stds(), &[1.0]);
        let scaled = state.transform(&train).unwrap();
        assert_eq!(scaled.features()[0][0], -1.0);
        assert!(scaled.features()[1][0].is_nan());
        assert_eq!(scaled.features()[2][0], 1.0);
    }

    #[test]
    fn all_missing_column_is_left_alone() {
        let train = matrix(vec![vec![MISSING, 1.0], vec![MISSING, 2.0]]);
        let state = Scaler::fit(&train).unwrap();
        assert_eq!(state.means()[0], 0.0);
        assert_eq!(state.stds()[0], 1.0);
    }

    #[test]
    fn test_rows_use_train_statistics() {
        let train = matrix(vec![vec![0.0], vec![10.0]]);
        let test = matrix(vec![vec![20.0]]);
        let scaled = Scaler::fit(&train).unwrap().transform(&test).unwrap();
        assert_eq!(scaled.features()[0][0], 3.0);
    }

    #[test]
    fn width_mismatch_rejected() {
        let state = Scaler::fit(&matrix(vec![vec![1.0, 2.0]])).unwrap();
        let err = state.transform(&matrix(vec![vec![1.0]])).unwrap_err();
        assert!(matches!(
            err,
            PrepError::FeatureCountMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn empty_train_rejected() {
        let empty = EncodedMatrix::new(vec![], vec![], vec!["f0".into()]);
        assert!(matches!(Scaler::fit(&empty), Err(PrepError::EmptyMatrix)));
    }
}
