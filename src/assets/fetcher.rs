//! Image downloader
//!
//! Fetches a binary resource and writes it into the asset directory,
//! returning the relative path records use to refer to it.

use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while downloading an asset
///
/// None of these are retried here; the enclosing extraction fails instead.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Downloads assets into one flat directory
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: Client,
    images_dir: PathBuf,
    reference_prefix: String,
}

impl AssetFetcher {
    /// Creates a fetcher writing into `images_dir`
    ///
    /// The directory itself is created lazily on the first download.
    pub fn new(images_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, FetchError> {
        let client = build_http_client(timeout).map_err(FetchError::Client)?;
        Ok(Self::with_client(client, images_dir))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, images_dir: impl Into<PathBuf>) -> Self {
        let images_dir = images_dir.into();
        let dir_name = images_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "images".to_string());

        Self {
            client,
            images_dir,
            reference_prefix: format!("./{}", dir_name),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Relative reference stored in records for `filename`
    pub fn reference_for(&self, filename: &str) -> String {
        format!("{}/{}", self.reference_prefix, filename)
    }

    /// Downloads `url` and stores the body as `filename`
    ///
    /// An existing file with the same name is overwritten.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Relative reference, e.g. `./images/taladro.jpg`
    /// * `Err(FetchError)` - Network failure, timeout, non-2xx status, or write failure
    pub async fn fetch(&self, url: &str, filename: &str) -> Result<String, FetchError> {
        tokio::fs::create_dir_all(&self.images_dir)
            .await
            .map_err(|source| FetchError::Io {
                path: self.images_dir.display().to_string(),
                source,
            })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?;

        let path = self.images_dir.join(filename);
        tokio::fs::write(&path, &body)
            .await
            .map_err(|source| FetchError::Io {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!("Saved {} ({} bytes) from {}", path.display(), body.len(), url);
        Ok(self.reference_for(filename))
    }
}

/// Builds the HTTP client used for asset downloads
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("catalog-sweep/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}
