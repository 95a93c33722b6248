//! Conversion of run artifacts into the persisted record types.

use netsift_forest::{AveragedMetrics, ClassificationReport, RankedFeature};
use netsift_io::{
    DatasetId, EncodingRecord, EvaluationRecord, FeatureRecord, ResultRecord, RunParameters,
    ScoreRecord, VocabularyRecord,
};
use netsift_prep::{EncodingSummary, Vocabularies, VocabularyKind};

use crate::config::PipelineConfig;

/// Row counts of a run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowCounts {
    pub(crate) n_rows: usize,
    pub(crate) n_train: usize,
    pub(crate) n_test: usize,
}

pub(crate) struct RunArtifacts<'a> {
    pub(crate) id: &'a DatasetId,
    pub(crate) config: &'a PipelineConfig,
    pub(crate) report: &'a ClassificationReport,
    pub(crate) importances: &'a [RankedFeature],
    pub(crate) vocabularies: &'a Vocabularies,
    pub(crate) summary: &'a EncodingSummary,
    pub(crate) rows: RowCounts,
}

impl RunArtifacts<'_> {
    pub(crate) fn into_record(self) -> ResultRecord {
        let forest = self.config.forest();
        ResultRecord {
            dataset_id: self.id.to_string(),
            accuracy: self.report.accuracy(),
            report: self.report.to_string(),
            processed: true,
            created_at: chrono::Utc::now(),
            evaluation: evaluation_record(self.report, self.importances),
            vocabularies: self
                .vocabularies
                .iter()
                .map(|v| VocabularyRecord {
                    column: v.column().to_string(),
                    derived: v.kind() == VocabularyKind::Derived,
                    entries: v
                        .canonical()
                        .into_iter()
                        .map(|(value, code)| (value.to_string(), code))
                        .collect(),
                })
                .collect(),
            encoding: EncodingRecord {
                unknown_category_policy: self.summary.policy().to_string(),
                unknown_counts: self
                    .summary
                    .unknown_counts()
                    .iter()
                    .map(|(&column, &count)| (column.to_string(), count))
                    .collect(),
            },
            parameters: RunParameters {
                seed: self.config.seed(),
                test_ratio: self.config.test_ratio(),
                n_trees: forest.n_trees(),
                max_features: forest.max_features().to_string(),
                max_depth: forest.max_depth(),
                min_samples_split: forest.min_samples_split(),
                min_samples_leaf: forest.min_samples_leaf(),
                criterion: forest.criterion().to_string(),
                n_rows: self.rows.n_rows,
                n_train: self.rows.n_train,
                n_test: self.rows.n_test,
            },
        }
    }
}

fn averaged(name: &str, avg: &AveragedMetrics) -> ScoreRecord {
    ScoreRecord {
        name: name.to_string(),
        precision: avg.precision,
        recall: avg.recall,
        f1: avg.f1,
        support: avg.support,
    }
}

fn evaluation_record(report: &ClassificationReport, importances: &[RankedFeature]) -> EvaluationRecord {
    EvaluationRecord {
        accuracy: report.accuracy(),
        classes: report
            .classes()
            .iter()
            .map(|c| ScoreRecord {
                name: c.name.clone(),
                precision: c.metrics.precision,
                recall: c.metrics.recall,
                f1: c.metrics.f1,
                support: c.metrics.support,
            })
            .collect(),
        macro_avg: averaged("macro avg", report.macro_avg()),
        weighted_avg: averaged("weighted avg", report.weighted_avg()),
        confusion_matrix: report.confusion_matrix().as_rows().to_vec(),
        feature_importances: importances
            .iter()
            .map(|f| FeatureRecord {
                name: f.name.clone(),
                importance: f.importance,
                rank: f.rank,
            })
            .collect(),
    }
}
