//! Durable, append-ordered collection of extracted records

use crate::store::traits::{JsonFileStore, StoreResult};
use crate::store::Record;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk shape: `{ "total": n, "products": [...] }`
///
/// `total` is informational; readers trust `products`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDocument {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub products: Vec<Record>,
}

impl RecordDocument {
    /// Builds the document for `records`, deriving `total` from its length
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            total: records.len(),
            products: records.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the stored records, empty when the file is missing or corrupt
    pub fn read(&self) -> Vec<Record> {
        self.load_document().products
    }

    /// Returns the stored records for a run that will append to them
    ///
    /// A file that exists but does not parse is moved to `<file>.corrupt`
    /// before anything is written, so earlier records are never overwritten.
    pub fn load(&self) -> StoreResult<Vec<Record>> {
        Ok(self.load_document_or_backup()?.products)
    }

    /// Overwrites the file with exactly `records`
    pub fn write_all(&self, records: &[Record]) -> StoreResult<()> {
        self.save_document(&RecordDocument::from_records(records))
    }

    pub fn reset(&self) -> StoreResult<()> {
        self.write_all(&[])
    }
}

impl JsonFileStore for RecordStore {
    type Document = RecordDocument;

    fn path(&self) -> &Path {
        &self.path
    }
}
