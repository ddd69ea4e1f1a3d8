//! Per-listing traversal: open each discovered card and parse it.
//!
//! The collector sweeps the currently rendered items top to bottom, opens
//! every discovered listing that has not been parsed yet, then scrolls on.
//! Records are produced lazily through a [`RecordStream`]; nothing is
//! buffered beyond the record being yielded.

use crate::discovery::DiscoverySet;
use crate::gate::{Interrupt, InterruptionGate};
use crate::page::{CardTarget, ListPage};
use crate::parser::CardParser;
use crate::scroll::{jitter, ScrollDriver};
use futures::stream::BoxStream;
use futures::StreamExt;
use orgmaps_core::{ListingId, OrganizationRecord, ScraperConfig};
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Lazy, finite stream of parsed organizations.
pub type RecordStream = BoxStream<'static, OrganizationRecord>;

/// Listing ids whose detail panel has been parsed in this traversal.
#[derive(Debug, Default)]
pub struct ParsedSet {
    ids: HashSet<ListingId>,
}

impl ParsedSet {
    /// Record `id` as parsed. Returns `false` if it already was.
    pub fn mark(&mut self, id: ListingId) -> bool {
        self.ids.insert(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ListingId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Timing and termination knobs for collection.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub limit: Option<usize>,
    pub card_timeout: Duration,
    pub stall_threshold: u32,
    pub round_delay_min_ms: u64,
    pub round_delay_max_ms: u64,
}

impl From<&ScraperConfig> for CollectorSettings {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            limit: config.limit,
            card_timeout: config.card_timeout(),
            stall_threshold: config.stall_threshold,
            round_delay_min_ms: config.round_delay_min_ms,
            round_delay_max_ms: config.round_delay_max_ms,
        }
    }
}

/// What happened to one listing during a sweep.
enum Visit {
    Parsed(OrganizationRecord),
    Skipped,
    Interrupted(Interrupt),
}

/// Opens discovered listings one at a time and yields their records.
pub struct CardCollector {
    page: Arc<dyn ListPage>,
    gate: Arc<InterruptionGate>,
    scroll: ScrollDriver,
    parser: CardParser,
    settings: CollectorSettings,
}

impl CardCollector {
    #[must_use]
    pub fn new(
        page: Arc<dyn ListPage>,
        gate: Arc<InterruptionGate>,
        scroll: ScrollDriver,
        parser: CardParser,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            page,
            gate,
            scroll,
            parser,
            settings,
        }
    }

    /// Traverse the list and yield one record per opened listing in `targets`.
    #[must_use]
    pub fn collect(self, targets: DiscoverySet) -> RecordStream {
        async_stream::stream! {
            let total = targets.len();
            if total == 0 {
                tracing::info!("No listings to collect");
                return;
            }

            self.scroll.reset(self.page.as_ref()).await;
            let mut parsed = ParsedSet::default();
            let mut stalled_rounds: u32 = 0;

            while parsed.len() < total {
                if let ControlFlow::Break(interrupt) = self.gate.checkpoint().await {
                    tracing::info!("Collection interrupted: {}", interrupt);
                    return;
                }
                if self.limit_reached(&parsed) {
                    tracing::info!("Limit reached: {}", parsed.len());
                    return;
                }

                let rendered = match self.page.rendered_ids().await {
                    Ok(ids) => ids,
                    Err(e) => {
                        tracing::debug!("Failed to read rendered ids: {}", e);
                        Vec::new()
                    }
                };
                if rendered.is_empty() {
                    tracing::info!("No rendered listings left to parse");
                    break;
                }

                let mut parsed_this_round = 0;
                for id in rendered {
                    if let ControlFlow::Break(interrupt) = self.gate.checkpoint().await {
                        tracing::info!("Collection interrupted: {}", interrupt);
                        return;
                    }
                    if !targets.contains(&id) || parsed.contains(&id) {
                        continue;
                    }
                    if self.limit_reached(&parsed) {
                        tracing::info!("Limit reached: {}", parsed.len());
                        return;
                    }

                    match self.visit(&id).await {
                        Visit::Parsed(record) => {
                            parsed.mark(id);
                            parsed_this_round += 1;
                            yield record;
                            if self.limit_reached(&parsed) {
                                tracing::info!("Limit reached: {}", parsed.len());
                                return;
                            }
                        }
                        Visit::Skipped => {}
                        Visit::Interrupted(interrupt) => {
                            tracing::info!("Collection interrupted: {}", interrupt);
                            return;
                        }
                    }
                }

                let probe = self.scroll.advance(self.page.as_ref()).await;
                if parsed_this_round == 0 && !probe.moved {
                    stalled_rounds += 1;
                } else {
                    stalled_rounds = 0;
                }
                if !probe.moved && stalled_rounds >= self.settings.stall_threshold {
                    tracing::info!("No progress and the list no longer scrolls, finishing");
                    break;
                }

                tokio::time::sleep(jitter(
                    self.settings.round_delay_min_ms,
                    self.settings.round_delay_max_ms,
                ))
                .await;
            }

            tracing::info!("Collection finished: parsed {} of {} listings", parsed.len(), total);
        }
        .boxed()
    }

    /// Open one listing's panel and parse it.
    async fn visit(&self, id: &ListingId) -> Visit {
        match self.page.open_item(id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("Clickable wrapper not found (id={})", id);
                return Visit::Skipped;
            }
            Err(e) => {
                tracing::info!("Failed to click listing (id={}): {}", id, e);
                return Visit::Skipped;
            }
        }

        if let ControlFlow::Break(interrupt) = self.gate.ensure_no_captcha().await {
            return Visit::Interrupted(interrupt);
        }

        let started = Instant::now();
        let html = match self.wait_for_card(id).await {
            ControlFlow::Continue(html) => html,
            ControlFlow::Break(interrupt) => return Visit::Interrupted(interrupt),
        };
        let Some(html) = html else {
            tracing::info!(
                "Card did not load (id={}, {:.2}s)",
                id,
                started.elapsed().as_secs_f64()
            );
            return Visit::Skipped;
        };
        tracing::info!(
            "Card loaded (id={}, {:.2}s)",
            id,
            started.elapsed().as_secs_f64()
        );

        if let ControlFlow::Break(interrupt) = self.gate.ensure_no_captcha().await {
            return Visit::Interrupted(interrupt);
        }

        let record = self.parser.parse(&html, Some(id));
        if let ControlFlow::Break(interrupt) = self.gate.check_stop() {
            return Visit::Interrupted(interrupt);
        }
        tracing::debug!("Card parsed (id={}): {}", id, record.name);
        Visit::Parsed(record)
    }

    /// Wait for the id-keyed panel, then once for any shown panel.
    ///
    /// Each wait is abandoned as soon as stop is requested.
    async fn wait_for_card(&self, id: &ListingId) -> ControlFlow<Interrupt, Option<String>> {
        let timeout = self.settings.card_timeout;
        for target in [CardTarget::Listing(id), CardTarget::AnyShown] {
            let waited = tokio::select! {
                waited = self.page.wait_for_card(target, timeout) => waited,
                () = self.gate.stopped() => return ControlFlow::Break(Interrupt::Stopped),
            };
            match waited {
                Ok(Some(html)) => return ControlFlow::Continue(Some(html)),
                Ok(None) => {}
                Err(e) => tracing::debug!("Waiting for card failed (id={}): {}", id, e),
            }
        }
        ControlFlow::Continue(None)
    }

    fn limit_reached(&self, parsed: &ParsedSet) -> bool {
        self.settings.limit.is_some_and(|limit| parsed.len() >= limit)
    }
}
