//! Durable resume cursor
//!
//! `lastIndex` is the first index a normal scan has not yet settled.

use crate::store::traits::{JsonFileStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk shape: `{ "lastIndex": n }`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointDocument {
    #[serde(rename = "lastIndex", default)]
    pub last_index: usize,
}

/// Single-integer cursor persisted between runs
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the stored cursor, or 0 when the file is missing or corrupt
    pub fn read(&self) -> usize {
        self.load_document().last_index
    }

    /// Replaces the stored cursor
    pub fn write(&self, index: usize) -> StoreResult<()> {
        self.save_document(&CheckpointDocument { last_index: index })
    }

    /// Rewinds the cursor to the first card
    pub fn reset(&self) -> StoreResult<()> {
        self.write(0)
    }
}

impl JsonFileStore for CheckpointStore {
    type Document = CheckpointDocument;

    fn path(&self) -> &Path {
        &self.path
    }
}
