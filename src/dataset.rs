//! Parameter-dataset access.
//!
//! The overrides generator reads a template parameter dataset to learn the
//! set of valid override keys, then writes a reduced dataset carrying only
//! the selected overrides. The [`DatasetStore`] trait keeps the compiler
//! independent of the on-disk format: the shipped [`JsonDatasetStore`]
//! keeps the attribute table as a JSON document, and a netCDF-backed store
//! for PISM's own `pism_config.nc` template plugs in behind the same trait.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A parameter dataset reduced to what the compiler needs: the attribute
/// table of its configuration variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamDataset {
    /// Attribute name -> attribute value
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ParamDataset {
    pub fn new(attributes: BTreeMap<String, serde_json::Value>) -> Self {
        Self { attributes }
    }

    /// True if the dataset knows the attribute `key`.
    pub fn has_attr(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Names of all known attributes.
    pub fn attr_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Replace the attribute table wholesale. The previous attributes are
    /// discarded, not merged.
    pub fn set_attrs(&mut self, attributes: BTreeMap<String, serde_json::Value>) {
        self.attributes = attributes;
    }
}

/// Errors raised while reading or writing parameter datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("dataset is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no dataset at '{0}'")]
    NotFound(String),
}

/// Open/write access to parameter datasets.
pub trait DatasetStore {
    fn open(&self, path: &Path) -> Result<ParamDataset, DatasetError>;
    fn write(&self, dataset: &ParamDataset, path: &Path) -> Result<(), DatasetError>;
}

/// File-backed store keeping the attribute table as a JSON document.
#[derive(Debug, Default)]
pub struct JsonDatasetStore;

impl DatasetStore for JsonDatasetStore {
    fn open(&self, path: &Path) -> Result<ParamDataset, DatasetError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    fn write(&self, dataset: &ParamDataset, path: &Path) -> Result<(), DatasetError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, dataset)?;
        Ok(())
    }
}

/// In-memory store for tests. Datasets are keyed by path and every write
/// is recorded so tests can assert on (or on the absence of) output.
#[derive(Debug, Default)]
pub struct MemoryDatasetStore {
    datasets: RefCell<BTreeMap<PathBuf, ParamDataset>>,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a dataset at `path`.
    pub fn with_dataset(path: impl Into<PathBuf>, dataset: ParamDataset) -> Self {
        let store = Self::new();
        store.datasets.borrow_mut().insert(path.into(), dataset);
        store
    }

    /// The dataset currently stored at `path`, if any.
    pub fn dataset_at(&self, path: impl AsRef<Path>) -> Option<ParamDataset> {
        self.datasets.borrow().get(path.as_ref()).cloned()
    }
}

impl DatasetStore for MemoryDatasetStore {
    fn open(&self, path: &Path) -> Result<ParamDataset, DatasetError> {
        self.datasets
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| DatasetError::NotFound(path.display().to_string()))
    }

    fn write(&self, dataset: &ParamDataset, path: &Path) -> Result<(), DatasetError> {
        self.datasets
            .borrow_mut()
            .insert(path.to_path_buf(), dataset.clone());
        Ok(())
    }
}
