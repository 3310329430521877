//! Durable list of indices whose extraction failed

use crate::store::traits::{JsonFileStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk shape: `{ "errors": [i, ...] }` in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDocument {
    #[serde(default)]
    pub errors: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct FailureStore {
    path: PathBuf,
}

impl FailureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the failed indices, empty when the file is missing or corrupt
    pub fn read(&self) -> Vec<usize> {
        self.load_document().errors
    }

    /// Returns the failed indices for a run that will write them back
    ///
    /// An unparseable file is moved to `<file>.corrupt` first.
    pub fn load(&self) -> StoreResult<Vec<usize>> {
        Ok(self.load_document_or_backup()?.errors)
    }

    /// Replaces the whole list; callers pass the complete new sequence
    pub fn write(&self, indices: &[usize]) -> StoreResult<()> {
        self.save_document(&FailureDocument {
            errors: indices.to_vec(),
        })
    }

    pub fn reset(&self) -> StoreResult<()> {
        self.write(&[])
    }
}

impl JsonFileStore for FailureStore {
    type Document = FailureDocument;

    fn path(&self) -> &Path {
        &self.path
    }
}
