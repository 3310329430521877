//! Asset module for record images
//!
//! This module handles:
//! - Deriving deterministic, filesystem-safe names from record names
//! - Downloading images into the flat asset directory

mod fetcher;
mod sanitize;

pub use fetcher::{build_http_client, AssetFetcher, FetchError};
pub use sanitize::{sanitize_filename, MAX_FILENAME_LEN};

/// File name of a record's primary image
pub fn primary_image_name(base: &str) -> String {
    format!("{}.jpg", base)
}

/// File name of a record's `n`th secondary image (1-based)
pub fn secondary_image_name(base: &str, n: usize) -> String {
    format!("{}_{}.jpg", base, n)
}
