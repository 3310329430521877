//! Page driver trait and error types
//!
//! The sweep never talks to a browser directly; it drives the catalog through
//! this capability so the automation layer can be swapped or scripted.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a page driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Invalid selector '{0}'")]
    Selector(String),
}

/// Result type for page driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Summary fields read from a card in the list view
///
/// Fields absent from the card are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardSummary {
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,
    /// `src` of the card's primary image
    pub image_url: String,
}

/// Capability to drive a list/detail catalog
///
/// One instance owns one page. Calls are strictly sequential.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigates to the catalog's list view
    async fn load_catalog_root(&mut self) -> DriverResult<()>;

    /// Scrolls until every lazily loaded card has rendered
    async fn scroll_to_fully_loaded(&mut self) -> DriverResult<()>;

    /// Number of cards currently in the list view
    async fn count_cards(&mut self) -> DriverResult<usize>;

    /// Reads the summary fields of the card at `index`
    ///
    /// Returns `None` when there is no card at that position.
    async fn read_card_summary(&mut self, index: usize) -> DriverResult<Option<CardSummary>>;

    /// Activates the card at `index` to open its detail view
    ///
    /// Returns `false` when the card has no clickable target.
    async fn open_detail(&mut self, index: usize) -> DriverResult<bool>;

    /// Waits for the detail view to render
    ///
    /// Returns `false` if it did not appear within `timeout`.
    async fn wait_for_detail_marker(&mut self, timeout: Duration) -> DriverResult<bool>;

    /// `src` of every secondary image in the detail view, in page order
    async fn read_secondary_image_urls(&mut self) -> DriverResult<Vec<String>>;

    /// Activates the detail view's back affordance
    ///
    /// Returns `false` when no back affordance exists.
    async fn navigate_back(&mut self) -> DriverResult<bool>;

    /// Waits for the list view to show cards again
    ///
    /// Returns `false` if no card appeared within `timeout`.
    async fn wait_for_list(&mut self, timeout: Duration) -> DriverResult<bool>;

    /// Ends the browser session
    async fn close(&mut self) -> DriverResult<()>;
}
