//! Store module for persisting sweep progress
//!
//! This module holds the three durable documents a sweep maintains:
//! - the checkpoint cursor (`lastIndex`)
//! - the failure list (`errors`)
//! - the extracted records (`total` + `products`)
//!
//! Each is a whole-file JSON document rewritten on every change.

mod checkpoint;
mod failures;
mod records;
mod traits;

pub use checkpoint::{CheckpointDocument, CheckpointStore};
pub use failures::{FailureDocument, FailureStore};
pub use records::{RecordDocument, RecordStore};
pub use traits::{backup_path, write_json_atomic, JsonFileStore, StoreError, StoreResult};

use crate::config::OutputConfig;
use serde::{Deserialize, Serialize};

/// One extracted catalog item
///
/// `image` and `images` hold relative asset paths (`./images/<file>`);
/// `image` is empty when the card had no primary image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// The three durable stores of one sweep
#[derive(Debug, Clone)]
pub struct Stores {
    pub checkpoint: CheckpointStore,
    pub failures: FailureStore,
    pub records: RecordStore,
}

impl Stores {
    /// Opens the stores at the locations named in the output configuration
    ///
    /// Nothing is touched on disk until the first write.
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            checkpoint: CheckpointStore::new(&config.checkpoint_path),
            failures: FailureStore::new(&config.failures_path),
            records: RecordStore::new(&config.records_path),
        }
    }

    /// Clears all three stores, used to start over from the first card
    pub fn reset_all(&self) -> StoreResult<()> {
        self.checkpoint.reset()?;
        self.failures.reset()?;
        self.records.reset()?;
        Ok(())
    }
}
