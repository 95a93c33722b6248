//! Integration tests: fixture file -> Dataset, and record -> JSON store -> record.

use std::collections::BTreeMap;
use std::path::Path;

use netsift_io::{
    DatasetId, DatasetLoader, DatasetRef, EncodingRecord, EvaluationRecord, Field, IoError,
    JsonResultStore, ResultRecord, ResultSink, RunParameters, ScoreRecord, VocabularyRecord,
    schema,
};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn sample_fixture_loads_in_schema_order() {
    let dataset_ref = DatasetRef::new(DatasetId::new("sample").unwrap(), fixture_path("sample.data"));
    let dataset = DatasetLoader::new(dataset_ref.path())
        .load()
        .expect("fixture should parse");

    assert_eq!(dataset.len(), 5);
    let labels: Vec<&str> = dataset.records().iter().map(|r| r.label()).collect();
    assert_eq!(labels, vec!["normal.", "normal.", "smurf.", "neptune.", "normal."]);

    for record in dataset.records() {
        assert_eq!(record.fields().len(), schema::N_FEATURES);
        for (column, field) in schema::SCHEMA.iter().zip(record.fields()) {
            match column.kind {
                schema::ColumnKind::Numeric => assert!(field.as_numeric().is_some()),
                schema::ColumnKind::Categorical => assert!(field.as_categorical().is_some()),
            }
        }
    }

    let services: Vec<&str> = dataset
        .records()
        .iter()
        .filter_map(|r| r.field(schema::SERVICE).and_then(Field::as_categorical))
        .collect();
    assert_eq!(services, vec!["http", "http", "ecr_i", "private", "domain_u"]);
}

#[test]
fn fixture_files_match_expected_errors() {
    let result = DatasetLoader::new(&fixture_path("empty.data")).load();
    assert!(
        matches!(result, Err(IoError::EmptyDataset)),
        "empty.data should give EmptyDataset, got: {result:?}"
    );

    let result = DatasetLoader::new(&fixture_path("short_row.data")).load();
    assert!(
        matches!(
            result,
            Err(IoError::SchemaMismatch { row_index: 1, expected: 42, got: 40 })
        ),
        "short_row.data should give SchemaMismatch, got: {result:?}"
    );

    let result = DatasetLoader::new(&fixture_path("nan.data")).load();
    assert!(
        matches!(
            result,
            Err(IoError::MalformedNumber { column: "dst_host_serror_rate", .. })
        ),
        "nan.data should give MalformedNumber, got: {result:?}"
    );

    let result = DatasetLoader::new(&fixture_path("missing.data")).load();
    assert!(matches!(result, Err(IoError::SourceUnreadable { .. })));
}

fn score(name: &str, support: usize) -> ScoreRecord {
    ScoreRecord {
        name: name.to_string(),
        precision: 0.5,
        recall: 0.25,
        f1: 0.375,
        support,
    }
}

#[test]
fn record_round_trips_through_store() {
    let dir = TempDir::new().unwrap();
    let store = JsonResultStore::new(&dir.path().join("results")).unwrap();

    let mut unknown_counts = BTreeMap::new();
    unknown_counts.insert("protocol_type".to_string(), 3);

    let record = ResultRecord {
        dataset_id: "kdd_sample".to_string(),
        accuracy: 0.5,
        report: "              precision    recall  f1-score   support\n".to_string(),
        processed: true,
        created_at: chrono::Utc::now(),
        evaluation: EvaluationRecord {
            accuracy: 0.5,
            classes: vec![score("normal", 2), score("attack", 2)],
            macro_avg: score("macro avg", 4),
            weighted_avg: score("weighted avg", 4),
            confusion_matrix: vec![vec![1, 1], vec![1, 1]],
            feature_importances: vec![],
        },
        vocabularies: vec![VocabularyRecord {
            column: "protocol_type".to_string(),
            derived: false,
            entries: vec![("icmp".into(), 2), ("tcp".into(), 0), ("udp".into(), 1)],
        }],
        encoding: EncodingRecord {
            unknown_category_policy: "missing".to_string(),
            unknown_counts,
        },
        parameters: RunParameters {
            seed: 7,
            test_ratio: 0.5,
            n_trees: 10,
            max_features: "sqrt".to_string(),
            max_depth: Some(4),
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: "entropy".to_string(),
            n_rows: 8,
            n_train: 4,
            n_test: 4,
        },
    };

    store.store(&record).unwrap();
    let id = DatasetId::new("kdd_sample").unwrap();
    let loaded = store.load(&id).unwrap();
    assert_eq!(loaded, record);
    assert_eq!(loaded.id().unwrap(), id);
}
