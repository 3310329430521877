use crate::config::types::{
    BrowserConfig, CatalogConfig, Config, OutputConfig, SelectorConfig, TimeoutConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::path::Path;
use url::Url;

const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_selector_config(&config.selectors)?;
    validate_browser_config(&config.browser)?;
    validate_timeout_config(&config.timeouts)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the catalog root URL
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.root_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root-url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "root-url '{}' must use http or https",
            config.root_url
        )));
    }

    Ok(())
}

/// Validates that every selector is non-empty and parses as CSS
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    let fields: [(&'static str, &str); 9] = [
        ("card", &config.card),
        ("name", &config.name),
        ("category", &config.category),
        ("price", &config.price),
        ("description", &config.description),
        ("image", &config.image),
        ("detail-marker", &config.detail_marker),
        ("secondary-images", &config.secondary_images),
        ("back", &config.back),
    ];

    for (field, selector) in fields {
        validate_selector(field, selector)?;
    }

    Ok(())
}

fn validate_selector(field: &'static str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() || Selector::parse(selector).is_err() {
        return Err(ConfigError::InvalidSelector {
            field,
            selector: selector.to_string(),
        });
    }
    Ok(())
}

/// Validates browser settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err(ConfigError::Validation(format!(
            "viewport must be non-zero, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }

    if config.scroll_step == 0 {
        return Err(ConfigError::Validation(
            "scroll-step must be > 0".to_string(),
        ));
    }

    if config.max_scroll_steps == 0 {
        return Err(ConfigError::Validation(
            "max-scroll-steps must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every bounded wait is within a sane range
fn validate_timeout_config(config: &TimeoutConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("detail-marker", config.detail_marker),
        ("list-reappear", config.list_reappear),
        ("asset-fetch", config.asset_fetch),
    ] {
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "timeouts.{} must be between {}ms and {}ms, got {}ms",
                name, MIN_TIMEOUT_MS, MAX_TIMEOUT_MS, value
            )));
        }
    }

    Ok(())
}

/// Validates output locations
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("checkpoint-path", &config.checkpoint_path),
        ("failures-path", &config.failures_path),
        ("records-path", &config.records_path),
        ("images-dir", &config.images_dir),
    ] {
        if is_blank(path) {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.images_dir.file_name().is_none() {
        return Err(ConfigError::Validation(format!(
            "images-dir '{}' must name a directory",
            config.images_dir.display()
        )));
    }

    Ok(())
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}
