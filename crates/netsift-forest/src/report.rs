//! Classification report: per-class metrics plus accuracy and averages.

use std::fmt;

use crate::confusion::{ClassMetrics, ConfusionMatrix};
use crate::error::ForestError;

const HEADERS: [&str; 4] = ["precision", "recall", "f1-score", "support"];

/// Precision, recall, F1 and support averaged over classes.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct AveragedMetrics {
    /// Averaged precision.
    pub precision: f64,
    /// Averaged recall.
    pub recall: f64,
    /// Averaged F1 score.
    pub f1: f64,
    /// Total support across all classes.
    pub support: usize,
}

/// Per-class metrics tagged with a display name.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NamedClassMetrics {
    /// Display name of the class.
    pub name: String,
    /// The metrics for this class.
    #[serde(flatten)]
    pub metrics: ClassMetrics,
}

/// Structured evaluation of a set of predictions.
///
/// `Display` renders the familiar `classification_report` text layout with
/// two decimal places.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClassificationReport {
    accuracy: f64,
    classes: Vec<NamedClassMetrics>,
    macro_avg: AveragedMetrics,
    weighted_avg: AveragedMetrics,
    confusion_matrix: ConfusionMatrix,
}

impl ClassificationReport {
    /// Build a report from true and predicted labels, one name per class.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfusionMatrix::from_labels`] errors, using
    /// `class_names.len()` as the class count.
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        class_names: &[&str],
    ) -> Result<Self, ForestError> {
        let matrix = ConfusionMatrix::from_labels(true_labels, predicted, class_names.len())?;
        Ok(Self::from_confusion(matrix, class_names))
    }

    /// Build a report from an existing confusion matrix.
    ///
    /// Classes without a name in `class_names` are labelled by their index.
    #[must_use]
    pub fn from_confusion(matrix: ConfusionMatrix, class_names: &[&str]) -> Self {
        let per_class = matrix.class_metrics();
        let total = matrix.total();
        let n = per_class.len().max(1) as f64;

        let mut macro_avg = AveragedMetrics {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            support: total,
        };
        let mut weighted_avg = macro_avg;
        for m in &per_class {
            macro_avg.precision += m.precision / n;
            macro_avg.recall += m.recall / n;
            macro_avg.f1 += m.f1 / n;
            if total > 0 {
                let w = m.support as f64 / total as f64;
                weighted_avg.precision += m.precision * w;
                weighted_avg.recall += m.recall * w;
                weighted_avg.f1 += m.f1 * w;
            }
        }

        let classes = per_class
            .into_iter()
            .map(|metrics| NamedClassMetrics {
                name: class_names
                    .get(metrics.class)
                    .map_or_else(|| metrics.class.to_string(), |s| (*s).to_string()),
                metrics,
            })
            .collect();

        Self {
            accuracy: matrix.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
            confusion_matrix: matrix,
        }
    }

    /// Fraction of correct predictions, in `[0, 1]`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Per-class metrics in class-index order.
    #[must_use]
    pub fn classes(&self) -> &[NamedClassMetrics] {
        &self.classes
    }

    /// Unweighted mean over classes.
    #[must_use]
    pub fn macro_avg(&self) -> &AveragedMetrics {
        &self.macro_avg
    }

    /// Support-weighted mean over classes.
    #[must_use]
    pub fn weighted_avg(&self) -> &AveragedMetrics {
        &self.weighted_avg
    }

    /// The underlying confusion matrix.
    #[must_use]
    pub fn confusion_matrix(&self) -> &ConfusionMatrix {
        &self.confusion_matrix
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.name.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        write!(f, "{:>width$} ", "")?;
        for h in HEADERS {
            write!(f, " {h:>9}")?;
        }
        writeln!(f)?;
        writeln!(f)?;

        for c in &self.classes {
            let m = &c.metrics;
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}
