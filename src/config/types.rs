use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Catalog-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Where the catalog lives
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Page that lists every card once fully scrolled
    #[serde(rename = "root-url")]
    pub root_url: String,
}

/// CSS selectors used to locate cards, their fields and the detail view
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// One element per catalog card in the list view
    pub card: String,

    // Card-relative summary fields
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,

    /// Card-relative primary image; also the element clicked to open the detail view
    pub image: String,

    /// Present only once the detail view has rendered
    #[serde(rename = "detail-marker")]
    pub detail_marker: String,

    /// Secondary images shown in the detail view
    #[serde(rename = "secondary-images")]
    pub secondary_images: String,

    /// "Back" affordance of the detail view
    pub back: String,
}

/// Browser session settings
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub headless: bool,

    #[serde(rename = "viewport-width", default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(rename = "viewport-height", default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Pixels scrolled per step while loading the full list
    #[serde(rename = "scroll-step", default = "default_scroll_step")]
    pub scroll_step: u32,

    /// Pause between scroll steps (milliseconds)
    #[serde(rename = "scroll-interval-ms", default = "default_scroll_interval_ms")]
    pub scroll_interval_ms: u64,

    /// Upper bound on scroll steps for pages that keep growing
    #[serde(rename = "max-scroll-steps", default = "default_max_scroll_steps")]
    pub max_scroll_steps: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            scroll_step: default_scroll_step(),
            scroll_interval_ms: default_scroll_interval_ms(),
            max_scroll_steps: default_max_scroll_steps(),
        }
    }
}

/// Bounded waits, all in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(rename = "detail-marker", default = "default_wait_ms")]
    pub detail_marker: u64,

    #[serde(rename = "list-reappear", default = "default_wait_ms")]
    pub list_reappear: u64,

    #[serde(rename = "asset-fetch", default = "default_asset_fetch_ms")]
    pub asset_fetch: u64,
}

impl TimeoutConfig {
    pub fn detail_marker(&self) -> Duration {
        Duration::from_millis(self.detail_marker)
    }

    pub fn list_reappear(&self) -> Duration {
        Duration::from_millis(self.list_reappear)
    }

    pub fn asset_fetch(&self) -> Duration {
        Duration::from_millis(self.asset_fetch)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            detail_marker: default_wait_ms(),
            list_reappear: default_wait_ms(),
            asset_fetch: default_asset_fetch_ms(),
        }
    }
}

/// Locations of the durable stores and downloaded images
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(rename = "checkpoint-path", default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    #[serde(rename = "failures-path", default = "default_failures_path")]
    pub failures_path: PathBuf,

    #[serde(rename = "records-path", default = "default_records_path")]
    pub records_path: PathBuf,

    #[serde(rename = "images-dir", default = "default_images_dir")]
    pub images_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: default_checkpoint_path(),
            failures_path: default_failures_path(),
            records_path: default_records_path(),
            images_dir: default_images_dir(),
        }
    }
}

/// Failure-list policy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetryConfig {
    /// Drop an index from the failure list once it is extracted successfully
    #[serde(rename = "prune-on-success", default)]
    pub prune_on_success: bool,
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

fn default_scroll_step() -> u32 {
    600
}

fn default_scroll_interval_ms() -> u64 {
    200
}

fn default_max_scroll_steps() -> u32 {
    500
}

fn default_wait_ms() -> u64 {
    5_000
}

fn default_asset_fetch_ms() -> u64 {
    30_000
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("estado.json")
}

fn default_failures_path() -> PathBuf {
    PathBuf::from("errores.json")
}

fn default_records_path() -> PathBuf {
    PathBuf::from("productos.json")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}
