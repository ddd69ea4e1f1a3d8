//! Scroll commands against the virtualized list container.

use crate::page::{ListPage, ScrollProbe};
use rand::Rng;
use std::time::Duration;

/// Issues fixed-step scrolls and lets the list settle after each one.
///
/// Scroll failures are never fatal: an unreadable container is reported as
/// a probe that did not move.
#[derive(Debug, Clone)]
pub struct ScrollDriver {
    step_px: u32,
    settle_min_ms: u64,
    settle_max_ms: u64,
}

impl ScrollDriver {
    #[must_use]
    pub fn new(step_px: u32) -> Self {
        Self {
            step_px,
            settle_min_ms: 150,
            settle_max_ms: 250,
        }
    }

    /// Set the randomized settle delay applied after every scroll.
    #[must_use]
    pub fn with_settle(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.settle_min_ms = min_ms;
        self.settle_max_ms = max_ms;
        self
    }

    /// Scroll forward by one step and report the new position.
    pub async fn advance(&self, page: &dyn ListPage) -> ScrollProbe {
        let probe = match page.scroll_by(self.step_px).await {
            Ok(probe) => probe,
            Err(e) => {
                tracing::info!("Failed to scroll the list: {}", e);
                return ScrollProbe::stuck();
            }
        };

        tokio::time::sleep(jitter(self.settle_min_ms, self.settle_max_ms)).await;

        tracing::debug!(
            moved = probe.moved,
            offset = ?probe.offset,
            max_offset = ?probe.max_offset,
            "List scrolled"
        );
        probe
    }

    /// Scroll back to the top of the list.
    pub async fn reset(&self, page: &dyn ListPage) {
        if let Err(e) = page.reset_scroll().await {
            tracing::info!("Failed to reset list scroll: {}", e);
        }
    }
}

/// Uniformly random delay in `[min_ms, max_ms]`.
pub(crate) fn jitter(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}
