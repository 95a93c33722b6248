use std::fmt;

use netsift_forest::ForestError;
use netsift_io::IoError;
use netsift_prep::PrepError;

/// A step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Admission: checking that no other run holds the dataset id.
    Start,
    /// Reading and validating the raw file.
    Load,
    /// Categorical and label encoding.
    Encode,
    /// Train/test partitioning.
    Split,
    /// Standardization.
    Scale,
    /// Forest fitting.
    Train,
    /// Prediction on the test subset.
    Predict,
    /// Metric computation.
    Evaluate,
    /// Handing the record to the sink.
    Store,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Start => "start",
            Stage::Load => "load",
            Stage::Encode => "encode",
            Stage::Split => "split",
            Stage::Scale => "scale",
            Stage::Train => "train",
            Stage::Predict => "predict",
            Stage::Evaluate => "evaluate",
            Stage::Store => "store",
        })
    }
}

/// Errors from a pipeline run, tagged by the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Returned when another run is already processing the same dataset id.
    #[error("dataset {id} is already being processed")]
    AlreadyProcessing {
        /// The contested dataset id.
        id: String,
    },

    /// Returned when the cancel flag was set before `stage` began.
    #[error("run cancelled before the {stage} stage")]
    Cancelled {
        /// The stage that did not start.
        stage: Stage,
    },

    /// Loading failed.
    #[error("load stage failed")]
    Load(#[source] IoError),

    /// Encoding failed.
    #[error("encode stage failed")]
    Encode(#[source] PrepError),

    /// Splitting failed.
    #[error("split stage failed")]
    Split(#[source] PrepError),

    /// Scaling failed.
    #[error("scale stage failed")]
    Scale(#[source] PrepError),

    /// Training failed.
    #[error("train stage failed")]
    Train(#[source] ForestError),

    /// Prediction failed.
    #[error("predict stage failed")]
    Predict(#[source] ForestError),

    /// Evaluation failed.
    #[error("evaluate stage failed")]
    Evaluate(#[source] ForestError),

    /// The sink rejected the record.
    #[error("store stage failed")]
    Store(#[source] IoError),
}

impl PipelineError {
    /// Return the stage the run stopped at.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::AlreadyProcessing { .. } => Stage::Start,
            PipelineError::Cancelled { stage } => *stage,
            PipelineError::Load(_) => Stage::Load,
            PipelineError::Encode(_) => Stage::Encode,
            PipelineError::Split(_) => Stage::Split,
            PipelineError::Scale(_) => Stage::Scale,
            PipelineError::Train(_) => Stage::Train,
            PipelineError::Predict(_) => Stage::Predict,
            PipelineError::Evaluate(_) => Stage::Evaluate,
            PipelineError::Store(_) => Stage::Store,
        }
    }
}
