//! Store traits and error types
//!
//! Every durable store is a single pretty-printed JSON document. Reads fail
//! soft to the document's default; writes replace the whole file.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while persisting a store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A store backed by one JSON file
pub trait JsonFileStore {
    /// Shape of the file on disk
    type Document: DeserializeOwned + Default;

    /// Location of the backing file
    fn path(&self) -> &Path;

    /// Reads the backing file
    ///
    /// A missing file, an unreadable file, or content that does not parse
    /// as `Document` all yield `Document::default()`.
    fn load_document(&self) -> Self::Document {
        match read_document(self.path()) {
            Loaded::Parsed(document) => document,
            Loaded::Missing | Loaded::Unreadable | Loaded::Unparseable => {
                Self::Document::default()
            }
        }
    }

    /// Reads the backing file, moving an unparseable one out of the way
    ///
    /// Same as `load_document`, except that a file which exists but does not
    /// parse is renamed to `<file>.corrupt` first, so the next save starts a
    /// fresh document instead of overwriting what was there.
    fn load_document_or_backup(&self) -> StoreResult<Self::Document> {
        let path = self.path();

        match read_document(path) {
            Loaded::Parsed(document) => Ok(document),
            Loaded::Missing | Loaded::Unreadable => Ok(Self::Document::default()),
            Loaded::Unparseable => {
                let backup = backup_path(path);
                std::fs::rename(path, &backup)?;
                tracing::warn!(
                    "Moved unparseable {} to {}",
                    path.display(),
                    backup.display()
                );
                Ok(Self::Document::default())
            }
        }
    }

    /// Overwrites the backing file with `document`
    fn save_document<T: Serialize + ?Sized>(&self, document: &T) -> StoreResult<()> {
        write_json_atomic(self.path(), document)
    }
}

enum Loaded<D> {
    Parsed(D),
    Missing,
    Unreadable,
    Unparseable,
}

fn read_document<D: DeserializeOwned>(path: &Path) -> Loaded<D> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("{} not found, starting empty", path.display());
            return Loaded::Missing;
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            return Loaded::Unreadable;
        }
    };

    match serde_json::from_str(&content) {
        Ok(document) => Loaded::Parsed(document),
        Err(e) => {
            tracing::warn!("Ignoring unparseable {}: {}", path.display(), e);
            Loaded::Unparseable
        }
    }
}

/// `<path>.corrupt`, next to the original
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

/// Serializes `value` and swaps it into place
///
/// The JSON is written to a temporary file in the destination directory and
/// renamed over `path`, so readers see either the old or the new document.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(value)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| StoreError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;

    Ok(())
}
