//! Scrape orchestrator tying session setup, discovery and collection together.
//!
//! This module provides the `MapsScraper` which opens a search session,
//! enumerates every listing in the result list and returns a lazy stream of
//! parsed organizations.

use crate::collector::{CardCollector, CollectorSettings, RecordStream};
use crate::discovery::{DiscoveryFinish, DiscoverySettings, IdDiscoveryEngine};
use crate::error::Result;
use crate::gate::InterruptionGate;
use crate::page::{ListPage, SessionProvider};
use crate::parser::CardParser;
use crate::scroll::ScrollDriver;
use crate::url_builder::build_search_url;
use futures::stream::{self, StreamExt};
use orgmaps_core::{ControlSignals, ScraperConfig};
use std::sync::Arc;

/// Runs one search and streams the organizations found.
pub struct MapsScraper {
    /// Source of browser pages positioned on search results
    provider: Arc<dyn SessionProvider>,
    /// Discovery / collection tuning
    config: ScraperConfig,
    /// Stop / pause / captcha-resume flags owned by the caller
    signals: ControlSignals,
}

impl MapsScraper {
    /// Create a new scraper.
    #[must_use]
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        config: ScraperConfig,
        signals: ControlSignals,
    ) -> Self {
        Self {
            provider,
            config,
            signals,
        }
    }

    /// Override the record limit (`None` = unlimited).
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.config.limit = limit.filter(|&l| l > 0);
        self
    }

    /// Open a search for `query` and return the record stream.
    ///
    /// Errors are returned only for session setup (navigation, results never
    /// appearing). Once the stream is handed out, stop requests and
    /// unresolved captchas simply end it.
    pub async fn run(&self, query: &str) -> Result<RecordStream> {
        let search_url = build_search_url(&self.config.base_url, query)?;
        tracing::info!(
            query = query.trim(),
            limit = ?self.config.limit,
            "Starting scraper"
        );

        let session = self.provider.open_session(&search_url).await?;
        let gate = Arc::new(InterruptionGate::new(
            self.signals.clone(),
            session.captcha.clone(),
            self.config.pause_poll(),
        ));
        let page = session.page;

        if gate.ensure_no_captcha().await.is_break() {
            return Ok(Self::empty());
        }
        if let Err(e) = page.dismiss_popups().await {
            tracing::debug!("Popup dismissal failed: {}", e);
        }
        if gate.ensure_no_captcha().await.is_break() {
            return Ok(Self::empty());
        }
        page.wait_for_results().await?;
        if gate.ensure_no_captcha().await.is_break() {
            return Ok(Self::empty());
        }

        let scroll = self.scroll_driver();
        let discovery = IdDiscoveryEngine::new(
            page.clone(),
            gate.clone(),
            scroll.clone(),
            DiscoverySettings::from(&self.config),
        )
        .discover()
        .await;

        if let DiscoveryFinish::Aborted(interrupt) = discovery.finish {
            tracing::info!("Discovery interrupted: {}", interrupt);
            return Ok(Self::empty());
        }
        tracing::info!("Unique organizations in the list: {}", discovery.ids.len());

        Ok(self.collector(page, gate, scroll).collect(discovery.ids))
    }

    fn collector(
        &self,
        page: Arc<dyn ListPage>,
        gate: Arc<InterruptionGate>,
        scroll: ScrollDriver,
    ) -> CardCollector {
        CardCollector::new(
            page,
            gate,
            scroll,
            CardParser::new(self.config.host.clone()),
            CollectorSettings::from(&self.config),
        )
    }

    fn scroll_driver(&self) -> ScrollDriver {
        ScrollDriver::new(self.config.scroll_step_px).with_settle(
            self.config.scroll_settle_min_ms,
            self.config.scroll_settle_max_ms,
        )
    }

    fn empty() -> RecordStream {
        stream::empty().boxed()
    }
}
