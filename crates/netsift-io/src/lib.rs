//! Traffic record schema, dataset loading, and result storage for netsift.

mod error;
mod loader;
mod record;
pub mod schema;
mod sink;
mod store;

pub use error::IoError;
pub use loader::DatasetLoader;
pub use record::{Dataset, DatasetId, DatasetRef, Field, TrafficRecord};
pub use sink::{
    EncodingRecord, EvaluationRecord, FeatureRecord, ResultRecord, ResultSink, RunParameters,
    ScoreRecord, VocabularyRecord,
};
pub use store::JsonResultStore;
