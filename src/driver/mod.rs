//! Page driver module
//!
//! This module contains the browser-facing side of a sweep:
//! - The `PageDriver` capability the orchestrator consumes
//! - A Chromium implementation configured by CSS selectors

mod chromium;
mod traits;

pub use chromium::{parse_card_summary, CardSelectors, ChromiumDriver};
pub use traits::{CardSummary, DriverError, DriverResult, PageDriver};
