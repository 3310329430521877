//! Catalog-Sweep: a resumable list/detail catalog harvester
//!
//! This crate walks the cards of a client-rendered catalog one index at a time,
//! opening each card's detail view through a browser session, downloading its
//! images and persisting the extracted records. Progress is checkpointed after
//! every index so an interrupted run resumes where it stopped, and indices that
//! failed can be re-attempted on their own.

pub mod assets;
pub mod config;
pub mod driver;
pub mod prompt;
pub mod store;
pub mod sweep;

use thiserror::Error;

/// Main error type for Catalog-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Page driver error: {0}")]
    Driver(#[from] driver::DriverError),

    #[error("Asset error: {0}")]
    Fetch(#[from] assets::FetchError),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: sweep::SweepPhase,
        to: sweep::SweepPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}' for {field}")]
    InvalidSelector { field: &'static str, selector: String },
}

/// Failure of the single-index extraction protocol
///
/// Any of these aborts the protocol for that one index; the orchestrator
/// records it and moves on.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No product card at index {index} ({available} cards visible)")]
    IndexOutOfRange { index: usize, available: usize },

    #[error("Card at index {index} has no clickable detail target")]
    NoDetailTarget { index: usize },

    #[error("Detail view for index {index} did not appear within {timeout_ms}ms")]
    DetailTimeout { index: usize, timeout_ms: u64 },

    #[error("Image download failed: {0}")]
    Fetch(#[from] assets::FetchError),

    #[error("Page driver failed: {0}")]
    Driver(#[from] driver::DriverError),
}

/// Result type alias for Catalog-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for the extraction protocol
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use assets::{sanitize_filename, AssetFetcher};
pub use config::Config;
pub use driver::{CardSummary, PageDriver};
pub use store::Record;
pub use sweep::{Orchestrator, RunMode, SweepPhase, SweepSummary};
