//! Sweep orchestrator - the checkpointed crawl/retry state machine
//!
//! This module ties the durable stores, the page driver and the asset
//! fetcher together:
//! - Loading the checkpoint, failure list and records at startup
//! - Walking indices in normal or retry-only mode
//! - Persisting every outcome before moving to the next index
//! - Recovering the list view between indices

use crate::assets::AssetFetcher;
use crate::config::Config;
use crate::driver::{DriverResult, PageDriver};
use crate::store::{Record, Stores};
use crate::sweep::extract::extract_record;
use crate::sweep::state::{RunMode, SweepPhase};
use crate::{Result, SweepError};
use std::time::Duration;

/// Tunables for one orchestrator
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Bounded wait for the detail view of a card
    pub detail_timeout: Duration,

    /// Bounded wait for the list view after navigating back
    pub list_timeout: Duration,

    /// Remove an index from the failure list once it succeeds
    pub prune_on_success: bool,
}

impl SweepOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            detail_timeout: config.timeouts.detail_marker(),
            list_timeout: config.timeouts.list_reappear(),
            prune_on_success: config.retry.prune_on_success,
        }
    }
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            detail_timeout: Duration::from_secs(5),
            list_timeout: Duration::from_secs(5),
            prune_on_success: false,
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    /// Mode the scan actually ran in
    pub mode: RunMode,

    /// Indices the run tried to extract
    pub attempted: usize,

    /// Indices extracted successfully during this run
    pub succeeded: usize,

    /// Records persisted in total, including earlier runs
    pub records: usize,

    /// Failure list as persisted at the end of the run
    pub failed_indices: Vec<usize>,
}

/// Drives one catalog through a list/detail cycle
///
/// Owns the in-memory copies of the failure list and records; every change to
/// them is written through to the stores before the next index starts.
pub struct Orchestrator<D: PageDriver> {
    driver: D,
    fetcher: AssetFetcher,
    stores: Stores,
    options: SweepOptions,
    phase: SweepPhase,
    start_index: usize,
    scraped: Vec<Record>,
    errors: Vec<usize>,
}

impl<D: PageDriver> Orchestrator<D> {
    /// Creates an orchestrator and loads the durable state
    ///
    /// Missing store files load as empty state. A failure list or record file
    /// that does not parse is moved to `<file>.corrupt` before the run can
    /// overwrite it.
    pub fn new(
        driver: D,
        fetcher: AssetFetcher,
        stores: Stores,
        options: SweepOptions,
    ) -> Result<Self> {
        let start_index = stores.checkpoint.read();
        let errors = stores.failures.load()?;
        let scraped = stores.records.load()?;

        tracing::info!(
            "Loaded state: checkpoint {}, {} records, {} failed indices",
            start_index,
            scraped.len(),
            errors.len()
        );

        Ok(Self {
            driver,
            fetcher,
            stores,
            options,
            phase: SweepPhase::Idle,
            start_index,
            scraped,
            errors,
        })
    }

    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    /// Index a normal scan would start from
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Indices recorded as failed, in discovery order
    pub fn failed_indices(&self) -> &[usize] {
        &self.errors
    }

    pub fn records(&self) -> &[Record] {
        &self.scraped
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Resolves the requested mode against the loaded failure list
    ///
    /// Retry-only is only meaningful with failures on record; otherwise the
    /// run falls back to a normal scan.
    pub fn select_mode(&self, requested: RunMode) -> RunMode {
        if requested == RunMode::RetryOnly && self.errors.is_empty() {
            tracing::info!("No failed indices on record, running a normal scan");
            return RunMode::Normal;
        }
        requested
    }

    /// Runs one sweep and closes the browser session
    ///
    /// Extraction failures never abort the run. Store write failures and
    /// failures to reload the catalog do; the session is closed either way.
    pub async fn run(&mut self, requested: RunMode) -> Result<SweepSummary> {
        self.transition(SweepPhase::ModeSelect)?;
        let mode = self.select_mode(requested);

        let outcome = self.scan(mode).await;

        if let Err(e) = self.driver.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }

        let (attempted, succeeded) = outcome?;
        self.transition(SweepPhase::Done)?;

        let summary = SweepSummary {
            mode,
            attempted,
            succeeded,
            records: self.scraped.len(),
            failed_indices: self.errors.clone(),
        };

        tracing::info!(
            "Saved {} records. Failed indices: [{}]",
            summary.records,
            crate::prompt::format_indices(&summary.failed_indices)
        );

        Ok(summary)
    }

    async fn scan(&mut self, mode: RunMode) -> Result<(usize, usize)> {
        self.driver.load_catalog_root().await?;
        self.driver.scroll_to_fully_loaded().await?;
        let total = self.driver.count_cards().await?;
        tracing::info!("{} cards visible in the catalog", total);

        self.transition(SweepPhase::scan_for(mode))?;
        match mode {
            RunMode::Normal => self.normal_scan(total).await,
            RunMode::RetryOnly => self.retry_scan().await,
        }
    }

    /// Walks `start_index..total` in ascending order
    ///
    /// Success advances the checkpoint past the index; failure records the
    /// index and leaves the checkpoint on it.
    async fn normal_scan(&mut self, total: usize) -> Result<(usize, usize)> {
        let mut attempted = 0;
        let mut succeeded = 0;

        if self.start_index >= total {
            tracing::info!(
                "Checkpoint {} is at or past the last card ({}), nothing to scan",
                self.start_index,
                total
            );
        }

        for index in self.start_index..total {
            attempted += 1;

            match extract_record(
                &mut self.driver,
                &self.fetcher,
                index,
                self.options.detail_timeout,
            )
            .await
            {
                Ok(record) => {
                    self.record_success(index, record)?;
                    self.stores.checkpoint.write(index + 1)?;
                    succeeded += 1;
                    tracing::info!("Product {}/{} saved", index + 1, total);
                }
                Err(e) => {
                    tracing::error!(
                        "Error at index {} ({}/{}): {}",
                        index,
                        index + 1,
                        total,
                        e
                    );
                    self.record_failure(index)?;
                    self.stores.checkpoint.write(index)?;
                }
            }

            self.recover_list_view().await?;
        }

        Ok((attempted, succeeded))
    }

    /// Re-attempts every recorded failure in discovery order
    ///
    /// The checkpoint is never touched in this mode.
    async fn retry_scan(&mut self) -> Result<(usize, usize)> {
        let pending = self.errors.clone();
        let mut succeeded = 0;

        for (position, &index) in pending.iter().enumerate() {
            match extract_record(
                &mut self.driver,
                &self.fetcher,
                index,
                self.options.detail_timeout,
            )
            .await
            {
                Ok(record) => {
                    self.record_success(index, record)?;
                    succeeded += 1;
                    tracing::info!(
                        "Retried index {} successfully ({}/{})",
                        index,
                        position + 1,
                        pending.len()
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Index {} failed again ({}/{}): {}",
                        index,
                        position + 1,
                        pending.len(),
                        e
                    );
                }
            }

            self.recover_list_view().await?;
        }

        Ok((pending.len(), succeeded))
    }

    fn record_success(&mut self, index: usize, record: Record) -> Result<()> {
        self.scraped.push(record);
        self.stores.records.write_all(&self.scraped)?;

        if self.options.prune_on_success {
            if let Some(position) = self.errors.iter().position(|&i| i == index) {
                self.errors.remove(position);
                self.stores.failures.write(&self.errors)?;
                tracing::debug!("Pruned index {} from the failure list", index);
            }
        }

        Ok(())
    }

    fn record_failure(&mut self, index: usize) -> Result<()> {
        if !self.errors.contains(&index) {
            self.errors.push(index);
        }
        self.stores.failures.write(&self.errors)?;
        Ok(())
    }

    /// Returns the page to the fully loaded list view
    ///
    /// Tries the detail view's back affordance first; if it is missing, fails,
    /// or the list does not reappear in time, reloads the catalog root and
    /// scrolls it to the bottom again.
    async fn recover_list_view(&mut self) -> Result<()> {
        match self.navigate_back().await {
            Ok(true) => return Ok(()),
            Ok(false) => tracing::warn!("Back navigation unavailable, reloading catalog"),
            Err(e) => tracing::warn!("Back navigation failed ({}), reloading catalog", e),
        }

        self.driver.load_catalog_root().await?;
        self.driver.scroll_to_fully_loaded().await?;
        Ok(())
    }

    async fn navigate_back(&mut self) -> DriverResult<bool> {
        if !self.driver.navigate_back().await? {
            return Ok(false);
        }
        self.driver.wait_for_list(self.options.list_timeout).await
    }

    fn transition(&mut self, next: SweepPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(SweepError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Sweep phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}
