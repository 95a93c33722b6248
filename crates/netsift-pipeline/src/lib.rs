//! End-to-end network traffic classification.
//!
//! A [`Pipeline`] loads a KDD Cup 99 formatted file, encodes it, splits it
//! into train and test rows, standardizes the features, fits a random
//! forest, evaluates it on the held-out rows, and hands a
//! [`ResultRecord`](netsift_io::ResultRecord) to a
//! [`ResultSink`](netsift_io::ResultSink).

mod cancel;
mod config;
mod error;
mod pipeline;
mod record;

pub use cancel::CancelFlag;
pub use config::{DEFAULT_N_TREES, PipelineConfig};
pub use error::{PipelineError, Stage};
pub use pipeline::Pipeline;
