//! The staged run: load, encode, split, scale, train, predict, evaluate, store.

use std::collections::HashMap;
use std::sync::Mutex;

use netsift_forest::ClassificationReport;
use netsift_io::{DatasetId, DatasetLoader, DatasetRef, ResultRecord, ResultSink};
use netsift_prep::{CLASS_NAMES, FeatureEncoder, Scaler, Splitter};
use tracing::{info, instrument, warn};

use crate::cancel::CancelFlag;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Stage};
use crate::record::{RowCounts, RunArtifacts};

/// Runs datasets through the full pipeline and hands each result to a sink.
///
/// A `Pipeline` may be shared across threads. Two concurrent runs for the
/// same dataset id are not allowed: the second returns
/// [`PipelineError::AlreadyProcessing`]. Each run has its own [`CancelFlag`],
/// so cancelling one run leaves other and later runs alone.
#[derive(Debug)]
pub struct Pipeline<S> {
    config: PipelineConfig,
    sink: S,
    in_flight: Mutex<HashMap<DatasetId, CancelFlag>>,
}

/// Removes a dataset id from the in-flight registry when the run ends.
struct InFlightGuard<'a> {
    registry: &'a Mutex<HashMap<DatasetId, CancelFlag>>,
    id: DatasetId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.remove(&self.id);
    }
}

impl<S: ResultSink> Pipeline<S> {
    /// Create a pipeline writing to `sink`.
    pub fn new(config: PipelineConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Return the sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Request cancellation of the run currently processing `id`.
    ///
    /// Returns false when no run for `id` is in flight.
    pub fn cancel(&self, id: &DatasetId) -> bool {
        let registry = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        match registry.get(id) {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Process one dataset end to end.
    ///
    /// The run can still be stopped through [`Pipeline::cancel`].
    ///
    /// # Errors
    ///
    /// See [`Pipeline::process_with_cancel`].
    pub fn process(&self, dataset: &DatasetRef) -> Result<ResultRecord, PipelineError> {
        self.process_with_cancel(dataset, &CancelFlag::new())
    }

    /// Process one dataset end to end, stopping at the next stage boundary
    /// once `cancel` is set.
    ///
    /// The sink is only called after every earlier stage succeeded, so a
    /// failed run never replaces a previously stored record. Cancellation
    /// is checked before each stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AlreadyProcessing`] if another run holds the
    /// same dataset id, [`PipelineError::Cancelled`] if the run was
    /// cancelled, or the stage variant wrapping the underlying failure.
    #[instrument(skip_all, fields(dataset_id = %dataset.id()))]
    pub fn process_with_cancel(
        &self,
        dataset: &DatasetRef,
        cancel: &CancelFlag,
    ) -> Result<ResultRecord, PipelineError> {
        let _guard = self.admit(dataset.id(), cancel)?;

        checkpoint(cancel, Stage::Load)?;
        let raw = DatasetLoader::new(dataset.path())
            .load()
            .map_err(PipelineError::Load)?;
        let n_rows = raw.len();

        checkpoint(cancel, Stage::Encode)?;
        let encoded = FeatureEncoder::new(self.config.unknown_category())
            .encode(&raw)
            .map_err(PipelineError::Encode)?;
        drop(raw);

        checkpoint(cancel, Stage::Split)?;
        let split = Splitter::new(self.config.test_ratio())
            .map_err(PipelineError::Split)?
            .with_seed(self.config.seed())
            .split(&encoded.matrix)
            .map_err(PipelineError::Split)?;

        checkpoint(cancel, Stage::Scale)?;
        let scaler = Scaler::fit(&split.train).map_err(PipelineError::Scale)?;
        let train = scaler.transform(&split.train).map_err(PipelineError::Scale)?;
        let test = scaler.transform(&split.test).map_err(PipelineError::Scale)?;

        checkpoint(cancel, Stage::Train)?;
        let fitted = self
            .config
            .forest()
            .fit(train.features(), train.labels(), train.feature_names())
            .map_err(PipelineError::Train)?;

        checkpoint(cancel, Stage::Predict)?;
        let predicted = fitted
            .forest()
            .predict_batch(test.features())
            .map_err(PipelineError::Predict)?;

        checkpoint(cancel, Stage::Evaluate)?;
        let report = ClassificationReport::from_labels(test.labels(), &predicted, &CLASS_NAMES)
            .map_err(PipelineError::Evaluate)?;
        info!(accuracy = report.accuracy(), n_test = test.n_rows(), "evaluation complete");

        let record = RunArtifacts {
            id: dataset.id(),
            config: &self.config,
            report: &report,
            importances: fitted.importances(),
            vocabularies: &encoded.vocabularies,
            summary: &encoded.summary,
            rows: RowCounts {
                n_rows,
                n_train: train.n_rows(),
                n_test: test.n_rows(),
            },
        }
        .into_record();

        checkpoint(cancel, Stage::Store)?;
        self.sink.store(&record).map_err(PipelineError::Store)?;
        info!("result stored");

        Ok(record)
    }

    fn admit(
        &self,
        id: &DatasetId,
        cancel: &CancelFlag,
    ) -> Result<InFlightGuard<'_>, PipelineError> {
        let mut registry = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if registry.contains_key(id) {
            warn!("dataset already being processed");
            return Err(PipelineError::AlreadyProcessing { id: id.to_string() });
        }
        registry.insert(id.clone(), cancel.clone());
        Ok(InFlightGuard {
            registry: &self.in_flight,
            id: id.clone(),
        })
    }
}

fn checkpoint(cancel: &CancelFlag, stage: Stage) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        info!(%stage, "run cancelled");
        return Err(PipelineError::Cancelled { stage });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use netsift_io::IoError;

    use super::*;

    #[derive(Default)]
    struct CountingSink {
        calls: Mutex<usize>,
    }

    impl ResultSink for CountingSink {
        fn store(&self, _record: &ResultRecord) -> Result<(), IoError> {
            *self.calls.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn missing(id: &str) -> DatasetRef {
        DatasetRef::new(DatasetId::new(id).unwrap(), format!("/nonexistent/{id}.data"))
    }

    #[test]
    fn cancelled_before_start_never_loads() {
        let pipeline = Pipeline::new(PipelineConfig::new(), Arc::new(CountingSink::default()));
        let flag = CancelFlag::new();
        flag.cancel();
        let err = pipeline.process_with_cancel(&missing("x"), &flag).unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { stage: Stage::Load }));
        assert_eq!(*pipeline.sink().calls.lock().unwrap(), 0);
    }

    #[test]
    fn cancellation_is_scoped_to_one_run() {
        let pipeline = Pipeline::new(PipelineConfig::new(), CountingSink::default());
        let flag = CancelFlag::new();
        flag.cancel();
        assert!(pipeline.process_with_cancel(&missing("a"), &flag).is_err());

        // Later runs, on the same id or another, get past admission to the loader.
        assert_eq!(pipeline.process(&missing("a")).unwrap_err().stage(), Stage::Load);
        assert!(matches!(
            pipeline.process(&missing("b")).unwrap_err(),
            PipelineError::Load(_)
        ));
    }

    #[test]
    fn cancel_targets_the_registered_run_only() {
        let pipeline = Pipeline::new(PipelineConfig::new(), CountingSink::default());
        let a = DatasetId::new("a").unwrap();
        let b = DatasetId::new("b").unwrap();
        let flag_a = CancelFlag::new();
        let flag_b = CancelFlag::new();
        let guard_a = pipeline.admit(&a, &flag_a).unwrap();
        let _guard_b = pipeline.admit(&b, &flag_b).unwrap();

        assert!(pipeline.cancel(&a));
        assert!(flag_a.is_cancelled());
        assert!(!flag_b.is_cancelled());
        assert!(!pipeline.cancel(&DatasetId::new("idle").unwrap()));

        drop(guard_a);
        assert!(!pipeline.cancel(&a));
    }

    #[test]
    fn missing_file_fails_at_load_and_releases_id() {
        let pipeline = Pipeline::new(PipelineConfig::new(), CountingSink::default());
        let dataset = missing("gone");
        let err = pipeline.process(&dataset).unwrap_err();
        assert_eq!(err.stage(), Stage::Load);
        let err = pipeline.process(&dataset).unwrap_err();
        assert_eq!(err.stage(), Stage::Load);
        assert!(pipeline.in_flight.lock().unwrap().is_empty());
    }
}
