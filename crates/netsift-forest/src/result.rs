//! What `RandomForestConfig::fit` hands back.

use crate::forest::RandomForest;
use crate::importance::RankedFeature;

/// Shape of a fitted forest and the data it saw.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TrainingMetadata {
    /// Trees in the ensemble.
    pub n_trees: usize,
    /// Feature columns (41 for KDD rows).
    pub n_features: usize,
    /// Class count, taken as the largest label plus one.
    pub n_classes: usize,
    /// Training rows before bootstrapping.
    pub n_samples: usize,
    /// Features drawn per split after resolving `MaxFeatures`.
    pub max_features_resolved: usize,
}

/// A fitted forest together with its MDI importance ranking.
#[derive(Debug)]
pub struct RandomForestResult {
    forest: RandomForest,
    importances: Vec<RankedFeature>,
    metadata: TrainingMetadata,
}

impl RandomForestResult {
    pub(crate) fn new(
        forest: RandomForest,
        importances: Vec<RankedFeature>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            importances,
            metadata,
        }
    }

    /// The forest used for prediction.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Consume the result and return the fitted forest.
    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Importances in descending order, rank 1 first.
    #[must_use]
    pub fn importances(&self) -> &[RankedFeature] {
        &self.importances
    }

    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
