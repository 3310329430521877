//! Chromium-backed page driver
//!
//! Drives a real browser through the DevTools protocol. Card summaries are
//! parsed from the rendered DOM with `scraper`; clicks, scrolling and marker
//! checks run as small scripts inside the page.

use crate::config::{BrowserConfig, Config, SelectorConfig};
use crate::driver::traits::{CardSummary, DriverError, DriverResult, PageDriver};
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use scraper::{ElementRef, Html, Selector};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How often bounded waits re-check the DOM
const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl From<CdpError> for DriverError {
    fn from(error: CdpError) -> Self {
        DriverError::Browser(error.to_string())
    }
}

/// Precompiled selectors for reading a card in the list view
#[derive(Debug, Clone)]
pub struct CardSelectors {
    card: Selector,
    name: Selector,
    category: Selector,
    price: Selector,
    description: Selector,
    image: Selector,
}

impl CardSelectors {
    pub fn compile(config: &SelectorConfig) -> DriverResult<Self> {
        Ok(Self {
            card: compile_selector(&config.card)?,
            name: compile_selector(&config.name)?,
            category: compile_selector(&config.category)?,
            price: compile_selector(&config.price)?,
            description: compile_selector(&config.description)?,
            image: compile_selector(&config.image)?,
        })
    }
}

fn compile_selector(selector: &str) -> DriverResult<Selector> {
    Selector::parse(selector).map_err(|_| DriverError::Selector(selector.to_string()))
}

/// Reads the summary of the `index`th card from rendered HTML
///
/// Returns `None` if the document has fewer than `index + 1` cards.
pub fn parse_card_summary(
    html: &str,
    selectors: &CardSelectors,
    index: usize,
) -> Option<CardSummary> {
    let document = Html::parse_document(html);
    let card = document.select(&selectors.card).nth(index)?;

    Some(CardSummary {
        name: text_of(&card, &selectors.name),
        category: text_of(&card, &selectors.category),
        price: text_of(&card, &selectors.price),
        description: text_of(&card, &selectors.description),
        image_url: card
            .select(&selectors.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .unwrap_or_default()
            .to_string(),
    })
}

fn text_of(card: &ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Encodes a selector as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn count_script(card: &str) -> String {
    format!(
        "(function() {{ return document.querySelectorAll({}).length; }})()",
        js_string(card)
    )
}

fn exists_script(selector: &str) -> String {
    format!(
        "(function() {{ return document.querySelector({}) !== null; }})()",
        js_string(selector)
    )
}

fn open_detail_script(card: &str, target: &str, index: usize) -> String {
    format!(
        "(function() {{
            const card = document.querySelectorAll({card})[{index}];
            if (!card) return false;
            const target = card.querySelector({target});
            if (!target) return false;
            target.click();
            return true;
        }})()",
        card = js_string(card),
        target = js_string(target),
        index = index
    )
}

fn click_script(selector: &str) -> String {
    format!(
        "(function() {{
            const el = document.querySelector({});
            if (!el) return false;
            el.click();
            return true;
        }})()",
        js_string(selector)
    )
}

fn image_sources_script(selector: &str) -> String {
    format!(
        "(function() {{
            return Array.from(document.querySelectorAll({}))
                .map(img => img.getAttribute('src') || '');
        }})()",
        js_string(selector)
    )
}

fn scroll_script(step: u32) -> String {
    format!(
        "(function() {{
            window.scrollBy(0, {});
            return Math.max(document.body.scrollHeight - window.innerHeight, 0);
        }})()",
        step
    )
}

/// Page driver backed by a Chromium instance
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    root_url: String,
    selectors: SelectorConfig,
    card_selectors: CardSelectors,
    scrolling: BrowserConfig,
}

impl ChromiumDriver {
    /// Launches the browser and opens a blank page
    ///
    /// The browser is headed unless `browser.headless` is set.
    pub async fn launch(config: &Config) -> DriverResult<Self> {
        let card_selectors = CardSelectors::compile(&config.selectors)?;
        let browser_settings = &config.browser;

        let mut builder = chromiumoxide::BrowserConfig::builder()
            .window_size(browser_settings.viewport_width, browser_settings.viewport_height)
            .viewport(Viewport {
                width: browser_settings.viewport_width,
                height: browser_settings.viewport_height,
                ..Viewport::default()
            });
        if !browser_settings.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(DriverError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;

        // The handler must be polled for the session to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        tracing::info!(
            "Browser launched ({}x{}, headless: {})",
            browser_settings.viewport_width,
            browser_settings.viewport_height,
            browser_settings.headless
        );

        Ok(Self {
            browser,
            page,
            handler,
            root_url: config.catalog.root_url.clone(),
            selectors: config.selectors.clone(),
            card_selectors,
            scrolling: browser_settings.clone(),
        })
    }
}

/// Polls until `selector` matches or `timeout` elapses
async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> DriverResult<bool> {
    let script = exists_script(selector);
    let script = script.as_str();
    Ok(poll_until(timeout, move || evaluate::<bool>(page, script)).await)
}

/// Re-runs `check` every `POLL_INTERVAL` until it reports true or `timeout` elapses
///
/// An error from `check` counts as "not yet": the page may be mid-navigation
/// with its execution context torn down.
async fn poll_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DriverResult<bool>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        match check().await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => tracing::trace!("Poll check failed, retrying: {}", e),
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn evaluate<T: DeserializeOwned>(page: &Page, script: &str) -> DriverResult<T> {
    page.evaluate(script)
        .await?
        .into_value::<T>()
        .map_err(|e| DriverError::Script(e.to_string()))
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn load_catalog_root(&mut self) -> DriverResult<()> {
        tracing::debug!("Loading catalog root {}", self.root_url);
        self.page
            .goto(self.root_url.as_str())
            .await
            .map_err(|e| DriverError::Navigation {
                url: self.root_url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn scroll_to_fully_loaded(&mut self) -> DriverResult<()> {
        let step = self.scrolling.scroll_step;
        let interval = Duration::from_millis(self.scrolling.scroll_interval_ms);
        let script = scroll_script(step);
        let mut scrolled: u64 = 0;

        for _ in 0..self.scrolling.max_scroll_steps {
            tokio::time::sleep(interval).await;
            let scrollable: f64 = evaluate(&self.page, &script).await?;
            scrolled += u64::from(step);
            if scrolled as f64 >= scrollable {
                tracing::debug!("Scrolled {}px to the end of the list", scrolled);
                return Ok(());
            }
        }

        tracing::warn!(
            "Stopped scrolling after {} steps; the list may be incomplete",
            self.scrolling.max_scroll_steps
        );
        Ok(())
    }

    async fn count_cards(&mut self) -> DriverResult<usize> {
        evaluate(&self.page, &count_script(&self.selectors.card)).await
    }

    async fn read_card_summary(&mut self, index: usize) -> DriverResult<Option<CardSummary>> {
        let html = self.page.content().await?;
        Ok(parse_card_summary(&html, &self.card_selectors, index))
    }

    async fn open_detail(&mut self, index: usize) -> DriverResult<bool> {
        let script = open_detail_script(&self.selectors.card, &self.selectors.image, index);
        evaluate(&self.page, &script).await
    }

    async fn wait_for_detail_marker(&mut self, timeout: Duration) -> DriverResult<bool> {
        wait_for_selector(&self.page, &self.selectors.detail_marker, timeout).await
    }

    async fn read_secondary_image_urls(&mut self) -> DriverResult<Vec<String>> {
        evaluate(
            &self.page,
            &image_sources_script(&self.selectors.secondary_images),
        )
        .await
    }

    async fn navigate_back(&mut self) -> DriverResult<bool> {
        evaluate(&self.page, &click_script(&self.selectors.back)).await
    }

    async fn wait_for_list(&mut self, timeout: Duration) -> DriverResult<bool> {
        wait_for_selector(&self.page, &self.selectors.card, timeout).await
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        tracing::info!("Browser session closed");
        Ok(())
    }
}
