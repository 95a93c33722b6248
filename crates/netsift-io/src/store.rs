//! JSON file store for result records.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::record::DatasetId;
use crate::sink::{ResultRecord, ResultSink};

/// Stores one pretty-printed JSON file per dataset id.
///
/// Creates the output directory on construction if it does not exist.
/// Each record is written to a uniquely named temporary file in the same
/// directory and renamed over `{dir}/{id}.json`, so readers see either the
/// old or the new record, even when several processes store the same id.
/// The temporary file is removed if the write or the rename fails.
#[derive(Debug, Clone)]
pub struct JsonResultStore {
    dir: PathBuf,
}

impl JsonResultStore {
    /// Create a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn new(dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(dir).map_err(|e| IoError::OutputDirCreate {
            path: dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Return the file path that holds the record for `id`.
    #[must_use]
    pub fn path_for(&self, id: &DatasetId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }

    /// Read back the stored record for `id`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::ReadResult`] | No record exists or it cannot be read |
    /// | [`IoError::DecodeResult`] | The file is not a valid record |
    pub fn load(&self, id: &DatasetId) -> Result<ResultRecord, IoError> {
        let path = self.path_for(id);
        let text = fs::read_to_string(&path).map_err(|e| IoError::ReadResult {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| IoError::DecodeResult { path, source: e })
    }
}

impl ResultSink for JsonResultStore {
    #[instrument(skip_all, fields(dataset = %record.dataset_id))]
    fn store(&self, record: &ResultRecord) -> Result<(), IoError> {
        let id = record.id()?;
        let path = self.path_for(&id);

        let json = serde_json::to_string_pretty(record).map_err(|e| IoError::Encode {
            id: record.dataset_id.clone(),
            source: e,
        })?;
        let write_err = |source| IoError::WriteFile {
            path: path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        debug!(tmp = %tmp.path().display(), "record staged");
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        info!(path = %path.display(), "result record written");
        Ok(())
    }
}
