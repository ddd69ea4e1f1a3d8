//! Scroll-driven enumeration of every listing id in the result list.
//!
//! The list is virtualized: only a window of items exists in the DOM at any
//! time. Discovery scrolls through the whole list, sampling the rendered ids
//! after each step, until the set of known ids stops growing.

use crate::gate::{Interrupt, InterruptionGate};
use crate::page::ListPage;
use crate::scroll::{jitter, ScrollDriver};
use orgmaps_core::{ListingId, ScraperConfig};
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Listing ids known to exist in the current search session.
///
/// Grows monotonically; there is no way to remove an id.
#[derive(Debug, Clone, Default)]
pub struct DiscoverySet {
    ids: HashSet<ListingId>,
}

impl DiscoverySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ids, returning how many were not known before.
    pub fn extend<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = ListingId>,
    {
        let before = self.ids.len();
        self.ids.extend(ids);
        self.ids.len() - before
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

    pub fn iter(&self) -> impl Iterator<Item = &ListingId> {
        self.ids.iter()
    }
}

impl FromIterator<ListingId> for DiscoverySet {
    fn from_iter<I: IntoIterator<Item = ListingId>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Why discovery stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryFinish {
    /// The configured limit was reached
    LimitReached,
    /// The container kept reporting the same offset with nothing new rendered
    ScrollSaturated,
    /// Scrolling stopped advancing and no late items arrived
    Idle,
    /// Stop was requested or a captcha was not resolved
    Aborted(Interrupt),
}

/// Ids found by one discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    pub ids: DiscoverySet,
    pub finish: DiscoveryFinish,
}

impl DiscoveryReport {
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self.finish, DiscoveryFinish::Aborted(_))
    }
}

/// Timing and termination knobs for discovery.
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub limit: Option<usize>,
    pub idle_timeout: Duration,
    pub idle_wait: Duration,
    pub idle_poll_min_ms: u64,
    pub idle_poll_max_ms: u64,
    pub saturation_rounds: u32,
}

impl From<&ScraperConfig> for DiscoverySettings {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            limit: config.limit,
            idle_timeout: config.idle_timeout(),
            idle_wait: config.idle_wait(),
            idle_poll_min_ms: config.idle_poll_min_ms,
            idle_poll_max_ms: config.idle_poll_max_ms,
            saturation_rounds: config.saturation_rounds,
        }
    }
}

/// Enumerates listing ids without opening any detail panel.
pub struct IdDiscoveryEngine {
    page: Arc<dyn ListPage>,
    gate: Arc<InterruptionGate>,
    scroll: ScrollDriver,
    settings: DiscoverySettings,
}

impl IdDiscoveryEngine {
    #[must_use]
    pub fn new(
        page: Arc<dyn ListPage>,
        gate: Arc<InterruptionGate>,
        scroll: ScrollDriver,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            page,
            gate,
            scroll,
            settings,
        }
    }

    /// Scroll through the list until the id set stabilizes or the limit is hit.
    pub async fn discover(&self) -> DiscoveryReport {
        let mut ids = DiscoverySet::new();
        ids.extend(self.sample().await);
        tracing::info!("Collecting listing ids: {} rendered at start", ids.len());

        let finish = self.run_rounds(&mut ids).await;
        tracing::info!(
            finish = ?finish,
            "Discovery finished with {} unique listings",
            ids.len()
        );
        DiscoveryReport { ids, finish }
    }

    async fn run_rounds(&self, ids: &mut DiscoverySet) -> DiscoveryFinish {
        let mut last_move = Instant::now();
        let mut last_offset: Option<i64> = None;
        let mut same_offset_rounds: u32 = 0;

        loop {
            if let ControlFlow::Break(interrupt) = self.gate.checkpoint().await {
                return DiscoveryFinish::Aborted(interrupt);
            }

            if self.limit_reached(ids) {
                tracing::info!("Limit reached while collecting ids");
                return DiscoveryFinish::LimitReached;
            }

            let probe = self.scroll.advance(self.page.as_ref()).await;
            let added = ids.extend(self.sample().await);

            if added > 0 {
                tracing::info!(
                    offset = ?probe.offset,
                    max_offset = ?probe.max_offset,
                    "Scrolling revealed {} new listings",
                    added
                );
                // Items appended without scroll movement still count as progress.
                last_move = Instant::now();
                last_offset = probe.offset.or(last_offset);
                same_offset_rounds = 0;
                continue;
            }

            if let Some(offset) = probe.offset {
                if last_offset == Some(offset) {
                    same_offset_rounds += 1;
                } else {
                    same_offset_rounds = 1;
                }
                last_offset = Some(offset);
            }

            if same_offset_rounds >= self.settings.saturation_rounds {
                tracing::info!("Scroll offset no longer changes, list is exhausted");
                return DiscoveryFinish::ScrollSaturated;
            }

            if probe.moved {
                last_move = Instant::now();
                continue;
            }

            if last_move.elapsed() >= self.settings.idle_timeout {
                tracing::info!(
                    "List has not scrolled for {:.2}s, ending discovery",
                    last_move.elapsed().as_secs_f64()
                );
                return DiscoveryFinish::Idle;
            }

            match self.wait_for_late_items(ids).await {
                ControlFlow::Break(interrupt) => return DiscoveryFinish::Aborted(interrupt),
                ControlFlow::Continue(0) => {
                    tracing::info!("No new listings arrived, ending discovery");
                    return DiscoveryFinish::Idle;
                }
                ControlFlow::Continue(arrived) => {
                    tracing::info!("{} listings arrived after waiting", arrived);
                    last_move = Instant::now();
                    same_offset_rounds = 0;
                }
            }
        }
    }

    /// Poll the rendered ids for a bounded time, returning how many new ones appeared.
    async fn wait_for_late_items(&self, ids: &mut DiscoverySet) -> ControlFlow<Interrupt, usize> {
        tracing::info!("Reached the end of the list, waiting for more listings");
        let started = Instant::now();
        let mut arrived = 0;

        while started.elapsed() < self.settings.idle_wait {
            tokio::time::sleep(jitter(
                self.settings.idle_poll_min_ms,
                self.settings.idle_poll_max_ms,
            ))
            .await;

            if let ControlFlow::Break(interrupt) = self.gate.checkpoint().await {
                return ControlFlow::Break(interrupt);
            }

            arrived += ids.extend(self.sample().await);
            if arrived > 0 {
                break;
            }
        }

        ControlFlow::Continue(arrived)
    }

    async fn sample(&self) -> Vec<ListingId> {
        match self.page.rendered_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::debug!("Failed to read rendered ids: {}", e);
                Vec::new()
            }
        }
    }

    fn limit_reached(&self, ids: &DiscoverySet) -> bool {
        self.settings.limit.is_some_and(|limit| ids.len() >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ListingId {
        ListingId::new(raw).expect("valid listing id")
    }

    #[test]
    fn test_discovery_set_is_monotonic() {
        let mut set = DiscoverySet::new();
        assert!(set.is_empty());
        assert_eq!(set.extend([id("1"), id("2")]), 2);
        assert_eq!(set.extend([id("2"), id("3")]), 1);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&id("1")));
        assert!(!set.contains(&id("4")));
    }

    #[test]
    fn test_discovery_set_idempotent_under_repeats() {
        let mut set: DiscoverySet = [id("10"), id("11")].into_iter().collect();
        for _ in 0..5 {
            assert_eq!(set.extend([id("10"), id("11")]), 0);
        }
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn test_settings_from_config() {
        let config = ScraperConfig {
            limit: Some(7),
            ..ScraperConfig::default()
        };
        let settings = DiscoverySettings::from(&config);
        assert_eq!(settings.limit, Some(7));
        assert_eq!(settings.idle_timeout, Duration::from_secs(10));
        assert_eq!(settings.saturation_rounds, 3);
    }
}
