//! Full runs over a generated KDD-formatted file.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier, Mutex};

use netsift_forest::RandomForestConfig;
use netsift_io::{DatasetId, DatasetRef, IoError, JsonResultStore, ResultRecord, ResultSink};
use netsift_pipeline::{CancelFlag, Pipeline, PipelineConfig, PipelineError, Stage};
use netsift_prep::UnknownCategoryPolicy;

/// One KDD row: normal traffic is http/SF with payload, neptune is private/S0 floods.
fn row(i: usize, attack: bool, protocol: &str) -> String {
    let (service, flag, src_bytes, count, serror, label) = if attack {
        ("private", "S0", 0, 200 + i % 50, "1.00", "neptune.")
    } else {
        ("http", "SF", 180 + i % 90, 1 + i % 9, "0.00", "normal.")
    };
    let mut fields: Vec<String> = vec![
        "0".into(),
        protocol.into(),
        service.into(),
        flag.into(),
        src_bytes.to_string(),
        (if attack { 0 } else { 400 + i }).to_string(),
    ];
    // land .. is_guest_login: indices 6..=21
    fields.extend(std::iter::repeat_n("0".to_string(), 16));
    fields.push(count.to_string()); // count
    fields.push(count.to_string()); // srv_count
    fields.push(serror.into()); // serror_rate
    fields.push(serror.into()); // srv_serror_rate
    // rerror_rate .. dst_host_srv_rerror_rate: indices 26..=40
    fields.extend(std::iter::repeat_n("0.00".to_string(), 15));
    fields.push(label.into());
    fields.join(",")
}

fn write_dataset(dir: &Path, name: &str, rows: &[String]) -> PathBuf {
    let mut body = String::new();
    for r in rows {
        writeln!(body, "{r}").unwrap();
    }
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// 70 normal rows then 30 neptune rows.
fn hundred_rows() -> Vec<String> {
    (0..100).map(|i| row(i, i >= 70, "tcp")).collect()
}

fn small_config() -> PipelineConfig {
    PipelineConfig::new().with_forest(RandomForestConfig::new(20).unwrap())
}

fn dataset(id: &str, path: PathBuf) -> DatasetRef {
    DatasetRef::new(DatasetId::new(id).unwrap(), path)
}

#[test]
fn generated_rows_have_42_fields() {
    assert_eq!(row(3, true, "tcp").split(',').count(), 42);
    assert_eq!(row(3, false, "udp").split(',').count(), 42);
}

#[test]
fn full_run_stores_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path(), "kdd.data", &hundred_rows());
    let store = JsonResultStore::new(&dir.path().join("results")).unwrap();
    let pipeline = Pipeline::new(small_config(), store);

    let record = pipeline.process(&dataset("kdd", path)).unwrap();

    assert!(record.processed);
    assert_eq!(record.dataset_id, "kdd");
    assert!((0.0..=1.0).contains(&record.accuracy));
    assert!(record.accuracy > 0.9, "accuracy {}", record.accuracy);
    assert_eq!(record.parameters.n_rows, 100);
    assert_eq!(record.parameters.n_test, 30);
    assert_eq!(record.parameters.n_train, 70);
    let support: usize = record.evaluation.classes.iter().map(|c| c.support).sum();
    assert_eq!(support, 30);
    assert_eq!(record.evaluation.classes[0].name, "normal");
    assert_eq!(record.evaluation.classes[1].name, "attack");
    assert_eq!(record.evaluation.feature_importances.len(), 41);
    assert!(record.report.contains("accuracy"));

    let service = record
        .vocabularies
        .iter()
        .find(|v| v.column == "service")
        .unwrap();
    assert!(service.derived);
    assert_eq!(service.entries.len(), 2);

    let id = DatasetId::new("kdd").unwrap();
    assert_eq!(pipeline.sink().load(&id).unwrap(), record);
}

#[test]
fn same_seed_reproduces_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path(), "kdd.data", &hundred_rows());
    let store = JsonResultStore::new(dir.path()).unwrap();
    let pipeline = Pipeline::new(small_config(), store);

    let first = pipeline.process(&dataset("a", path.clone())).unwrap();
    let second = pipeline.process(&dataset("b", path)).unwrap();

    assert_eq!(first.evaluation, second.evaluation);
    assert_eq!(first.parameters, second.parameters);
    assert_eq!(first.report, second.report);
}

#[test]
fn failed_run_keeps_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_dataset(dir.path(), "good.data", &hundred_rows());
    let mut broken = hundred_rows();
    broken[50] = "0,tcp,http".to_string();
    let bad = write_dataset(dir.path(), "bad.data", &broken);

    let store = JsonResultStore::new(&dir.path().join("results")).unwrap();
    let pipeline = Pipeline::new(small_config(), store);

    let stored = pipeline.process(&dataset("kdd", good)).unwrap();
    let err = pipeline.process(&dataset("kdd", bad)).unwrap_err();
    assert_eq!(err.stage(), Stage::Load);

    let id = DatasetId::new("kdd").unwrap();
    assert_eq!(pipeline.sink().load(&id).unwrap(), stored);
}

#[test]
fn unsupported_ratio_fails_at_split() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path(), "kdd.data", &hundred_rows());
    let store = JsonResultStore::new(dir.path()).unwrap();
    let pipeline = Pipeline::new(small_config().with_test_ratio(1.5), store);

    let err = pipeline.process(&dataset("kdd", path)).unwrap_err();
    assert!(matches!(err, PipelineError::Split(_)));
    assert!(!pipeline.sink().path_for(&DatasetId::new("kdd").unwrap()).exists());
}

#[test]
fn cancelled_run_never_reaches_sink() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path(), "kdd.data", &hundred_rows());
    let store = JsonResultStore::new(dir.path()).unwrap();
    let pipeline = Pipeline::new(small_config(), store);

    let flag = CancelFlag::new();
    flag.cancel();
    let err = pipeline
        .process_with_cancel(&dataset("kdd", path), &flag)
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled { .. }));
    assert!(!pipeline.sink().path_for(&DatasetId::new("kdd").unwrap()).exists());
}

#[test]
fn cancelling_one_run_leaves_later_runs_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path(), "kdd.data", &hundred_rows());
    let store = JsonResultStore::new(&dir.path().join("results")).unwrap();
    let pipeline = Pipeline::new(small_config(), store);

    let flag = CancelFlag::new();
    flag.cancel();
    let err = pipeline
        .process_with_cancel(&dataset("first", path.clone()), &flag)
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Load);

    let other = pipeline.process(&dataset("second", path.clone())).unwrap();
    assert_eq!(other.dataset_id, "second");
    let retry = pipeline.process(&dataset("first", path)).unwrap();
    assert_eq!(retry.dataset_id, "first");
    assert!(pipeline.sink().path_for(&DatasetId::new("first").unwrap()).exists());
}

#[test]
fn unknown_protocol_is_encoded_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = hundred_rows();
    rows[5] = row(5, false, "sctp");
    let path = write_dataset(dir.path(), "kdd.data", &rows);
    let store = JsonResultStore::new(dir.path()).unwrap();
    let pipeline = Pipeline::new(small_config(), store);

    let record = pipeline.process(&dataset("kdd", path)).unwrap();

    assert_eq!(record.encoding.unknown_category_policy, "missing");
    assert_eq!(record.encoding.unknown_counts.get("protocol_type"), Some(&1));
}

#[test]
fn unknown_protocol_rejected_under_reject_policy() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = hundred_rows();
    rows[5] = row(5, false, "sctp");
    let path = write_dataset(dir.path(), "kdd.data", &rows);
    let store = JsonResultStore::new(dir.path()).unwrap();
    let config = small_config().with_unknown_category(UnknownCategoryPolicy::Reject);
    let pipeline = Pipeline::new(config, store);

    let err = pipeline.process(&dataset("kdd", path)).unwrap_err();
    assert_eq!(err.stage(), Stage::Encode);
}

/// Blocks inside `store` until the test releases it.
struct GateSink {
    entered: Barrier,
    release: Barrier,
    records: Mutex<Vec<ResultRecord>>,
}

impl ResultSink for GateSink {
    fn store(&self, record: &ResultRecord) -> Result<(), IoError> {
        self.entered.wait();
        self.release.wait();
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[test]
fn concurrent_run_for_same_id_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path(), "kdd.data", &hundred_rows());
    let sink = Arc::new(GateSink {
        entered: Barrier::new(2),
        release: Barrier::new(2),
        records: Mutex::new(Vec::new()),
    });
    let pipeline = Pipeline::new(small_config(), Arc::clone(&sink));
    let target = dataset("kdd", path);

    std::thread::scope(|scope| {
        let first = scope.spawn(|| pipeline.process(&target));

        sink.entered.wait();
        let err = pipeline.process(&target).unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyProcessing { ref id } if id == "kdd"));
        assert_eq!(err.stage(), Stage::Start);
        sink.release.wait();

        assert!(first.join().unwrap().is_ok());
    });

    assert_eq!(sink.records.lock().unwrap().len(), 1);
}
