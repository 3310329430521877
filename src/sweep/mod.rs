//! Sweep module - crawl orchestration
//!
//! This module contains the core of a run:
//! - The single-index extraction protocol
//! - The checkpointed normal/retry-only state machine
//! - Run mode and phase definitions

mod extract;
mod orchestrator;
mod state;

pub use extract::{absolute_http_urls, extract_record};
pub use orchestrator::{Orchestrator, SweepOptions, SweepSummary};
pub use state::{RunMode, SweepPhase};

use crate::assets::AssetFetcher;
use crate::config::Config;
use crate::driver::ChromiumDriver;
use crate::store::Stores;
use crate::SweepError;

/// Runs a complete sweep against a real browser
///
/// This is the main entry point for the CLI. It will:
/// 1. Open the durable stores named in the configuration
/// 2. Launch the browser and build the asset fetcher
/// 3. Run the orchestrator in the given mode
///
/// # Example
///
/// ```no_run
/// use catalog_sweep::config::load_config;
/// use catalog_sweep::sweep::{run_sweep, RunMode};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sweep.toml"))?;
/// let summary = run_sweep(&config, RunMode::Normal).await?;
/// println!("{} records", summary.records);
/// # Ok(())
/// # }
/// ```
pub async fn run_sweep(config: &Config, mode: RunMode) -> Result<SweepSummary, SweepError> {
    let stores = Stores::from_config(&config.output);
    let fetcher = AssetFetcher::new(&config.output.images_dir, config.timeouts.asset_fetch())?;
    let driver = ChromiumDriver::launch(config).await?;

    let mut orchestrator =
        Orchestrator::new(driver, fetcher, stores, SweepOptions::from_config(config))?;
    orchestrator.run(mode).await
}
