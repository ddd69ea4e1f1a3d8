//! One search results tab driven through JavaScript probes.

use crate::actions::BrowserActions;
use crate::error::{BrowserError, Result};
use crate::scripts;
use async_trait::async_trait;
use chromiumoxide::Page;
use orgmaps_core::{ListingId, SelectorConfig};
use orgmaps_scraper::{CardTarget, ListPage, ScrollProbe};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const POPUP_TIMEOUT: Duration = Duration::from_secs(2);
const POPUP_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrollReport {
    moved: bool,
    offset: Option<i64>,
    max_offset: Option<i64>,
}

impl From<ScrollReport> for ScrollProbe {
    fn from(report: ScrollReport) -> Self {
        Self {
            moved: report.moved,
            offset: report.offset,
            max_offset: report.max_offset,
        }
    }
}

/// Detail panel selector: keyed to one listing, or any panel carrying an id.
fn card_selector(card: &str, target: CardTarget<'_>) -> String {
    match target {
        CardTarget::Listing(id) => {
            format!("{card}[data-id={}]", serde_json::Value::from(id.as_str()))
        }
        CardTarget::AnyShown => format!("{card}[data-id]"),
    }
}

/// A chromiumoxide tab positioned on map search results.
#[derive(Debug, Clone)]
pub struct MapsPage {
    page: Page,
    selectors: SelectorConfig,
    navigation_timeout: Duration,
    results_timeout: Duration,
}

impl MapsPage {
    pub fn new(page: Page, selectors: SelectorConfig) -> Self {
        Self {
            page,
            selectors,
            navigation_timeout: Duration::from_secs(20),
            results_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeouts(mut self, navigation: Duration, results: Duration) -> Self {
        self.navigation_timeout = navigation;
        self.results_timeout = results;
        self
    }

    /// The underlying chromiumoxide page
    pub fn inner(&self) -> &Page {
        &self.page
    }

    async fn eval_as<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let value = self.evaluate(script).await?;
        serde_json::from_value(value).map_err(|e| BrowserError::Evaluation(e.to_string()))
    }

    /// Re-read the first match of `selector` until it exists or `timeout` passes.
    async fn poll_for_html(&self, selector: &str, timeout: Duration) -> Result<Option<String>> {
        let started = Instant::now();
        loop {
            if let Some(html) = self.outer_html(selector).await? {
                return Ok(Some(html));
            }
            if started.elapsed() >= timeout {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Try to click a consent / close button labelled `label` for a short while.
    async fn dismiss_popup(&self, label: &str) -> Result<bool> {
        let script = scripts::click_button_with_label(label);
        let started = Instant::now();
        loop {
            if self.eval_as::<bool>(&script).await? {
                return Ok(true);
            }
            if started.elapsed() >= POPUP_TIMEOUT {
                return Ok(false);
            }
            tokio::time::sleep(POPUP_POLL).await;
        }
    }
}

#[async_trait]
impl BrowserActions for MapsPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::NavigationError(e.to_string())),
            Err(_) => Err(BrowserError::Timeout(format!("navigation to {url}"))),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let script = scripts::exists(selector);
        let started = Instant::now();
        loop {
            if self.eval_as::<bool>(&script).await? {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::Timeout(format!(
                    "{selector} did not appear within {:.1}s",
                    timeout.as_secs_f64()
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn outer_html(&self, selector: &str) -> Result<Option<String>> {
        self.eval_as(&scripts::outer_html(selector)).await
    }
}

#[async_trait]
impl ListPage for MapsPage {
    async fn rendered_ids(&self) -> orgmaps_scraper::Result<Vec<ListingId>> {
        let raw: Vec<String> = self
            .eval_as(&scripts::rendered_ids(&self.selectors.list_item))
            .await?;
        Ok(raw
            .into_iter()
            .filter_map(|id| ListingId::new(id).ok())
            .collect())
    }

    async fn scroll_by(&self, step_px: u32) -> orgmaps_scraper::Result<ScrollProbe> {
        let report: ScrollReport = self
            .eval_as(&scripts::scroll_by(&self.selectors.scroll_container, step_px))
            .await?;
        Ok(report.into())
    }

    async fn reset_scroll(&self) -> orgmaps_scraper::Result<()> {
        let found: bool = self
            .eval_as(&scripts::reset_scroll(&self.selectors.scroll_container))
            .await?;
        if !found {
            let selector = self.selectors.scroll_container.clone();
            return Err(BrowserError::SelectorNotFound(selector).into());
        }
        Ok(())
    }

    async fn open_item(&self, id: &ListingId) -> orgmaps_scraper::Result<bool> {
        let script = scripts::open_item(
            &self.selectors.list_item,
            &self.selectors.list_item_wrapper,
            id.as_str(),
        );
        Ok(self.eval_as(&script).await?)
    }

    async fn wait_for_card(
        &self,
        target: CardTarget<'_>,
        timeout: Duration,
    ) -> orgmaps_scraper::Result<Option<String>> {
        let selector = card_selector(&self.selectors.card, target);
        Ok(self.poll_for_html(&selector, timeout).await?)
    }

    async fn dismiss_popups(&self) -> orgmaps_scraper::Result<()> {
        for label in &self.selectors.popup_button_labels {
            tracing::debug!("Trying to close popup: {}", label);
            match self.dismiss_popup(label).await {
                Ok(true) => {
                    tracing::info!("Closed popup: {}", label);
                    let delay = Duration::from_millis(rand::thread_rng().gen_range(200..=600));
                    tokio::time::sleep(delay).await;
                }
                Ok(false) => {}
                Err(e) => tracing::debug!("Popup check failed ({}): {}", label, e),
            }
        }
        Ok(())
    }

    async fn wait_for_results(&self) -> orgmaps_scraper::Result<()> {
        tracing::info!("Waiting for the results list");
        let started = Instant::now();
        self.wait_for_selector(&self.selectors.list_item, self.results_timeout)
            .await?;
        tracing::info!(
            "Results list loaded in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
