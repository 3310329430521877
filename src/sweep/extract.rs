//! Single-index extraction protocol
//!
//! Shared by both scan modes. Any failure aborts the whole protocol for the
//! index, so a partially extracted record never leaves this module.

use crate::assets::{primary_image_name, sanitize_filename, secondary_image_name, AssetFetcher};
use crate::driver::PageDriver;
use crate::store::Record;
use crate::{ExtractError, ExtractResult};
use std::time::Duration;
use url::Url;

/// Extracts the record for the card at `index`
///
/// # Protocol
///
/// 1. Re-count the visible cards; a stale index is `IndexOutOfRange`
/// 2. Read the card's summary fields (missing fields are empty)
/// 3. Open the detail view; no clickable target is `NoDetailTarget`
/// 4. Wait for the detail marker; a timeout is `DetailTimeout`
/// 5. Read secondary image URLs, keeping only absolute http(s) ones
/// 6. Download the primary image as `<base>.jpg` and secondary images as
///    `<base>_<n>.jpg` (1-based, page order)
///
/// The driver is left wherever the protocol stopped; callers recover
/// navigation afterwards.
pub async fn extract_record<D: PageDriver + ?Sized>(
    driver: &mut D,
    fetcher: &AssetFetcher,
    index: usize,
    detail_timeout: Duration,
) -> ExtractResult<Record> {
    let available = driver.count_cards().await?;
    if index >= available {
        return Err(ExtractError::IndexOutOfRange { index, available });
    }

    let summary = driver
        .read_card_summary(index)
        .await?
        .ok_or(ExtractError::IndexOutOfRange { index, available })?;

    if !driver.open_detail(index).await? {
        return Err(ExtractError::NoDetailTarget { index });
    }

    if !driver.wait_for_detail_marker(detail_timeout).await? {
        return Err(ExtractError::DetailTimeout {
            index,
            timeout_ms: detail_timeout.as_millis() as u64,
        });
    }

    let secondary_urls = absolute_http_urls(driver.read_secondary_image_urls().await?);

    let base = sanitize_filename(&summary.name);

    let image = if summary.image_url.is_empty() {
        String::new()
    } else {
        fetcher
            .fetch(&summary.image_url, &primary_image_name(&base))
            .await?
    };

    let mut images = Vec::with_capacity(secondary_urls.len());
    for (n, url) in secondary_urls.iter().enumerate() {
        images.push(fetcher.fetch(url, &secondary_image_name(&base, n + 1)).await?);
    }

    Ok(Record {
        name: summary.name,
        category: summary.category,
        price: summary.price,
        description: summary.description,
        image,
        images,
    })
}

/// Keeps only absolute `http`/`https` URLs, preserving order
pub fn absolute_http_urls(urls: Vec<String>) -> Vec<String> {
    urls.into_iter()
        .filter(|raw| {
            Url::parse(raw)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false)
        })
        .collect()
}
