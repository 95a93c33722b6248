//! Preprocessing for traffic records: categorical encoding, seeded
//! train/test splitting, and standardization.

mod encoder;
mod error;
mod matrix;
mod scaler;
mod split;
mod vocabulary;

pub use encoder::{
    CLASS_NAMES, Encoded, EncodingSummary, FeatureEncoder, NORMAL_LABEL, UnknownCategoryPolicy,
    encode_label,
};
pub use error::PrepError;
pub use matrix::{EncodedMatrix, MISSING};
pub use scaler::{Scaler, ScalerState};
pub use split::{Split, Splitter};
pub use vocabulary::{CategoryVocabulary, FLAGS, PROTOCOL_TYPES, Vocabularies, VocabularyKind};
