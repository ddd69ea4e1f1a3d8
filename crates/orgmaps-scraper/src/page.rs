//! Collaborator seams between the traversal engine and a live browser page.
//!
//! The engine never talks to a browser directly. It drives a [`ListPage`]
//! (the rendered result list plus its detail panel), asks a [`CaptchaGate`]
//! about anti-bot interstitials, and obtains both from a [`SessionProvider`].

use crate::error::Result;
use async_trait::async_trait;
use orgmaps_core::{ControlSignals, ListingId};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one scroll command against the list container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollProbe {
    /// Whether the container's scroll offset advanced
    pub moved: bool,
    /// Offset after the scroll, when the container could be read
    pub offset: Option<i64>,
    /// Largest reachable offset, when the container could be read
    pub max_offset: Option<i64>,
}

impl ScrollProbe {
    /// A probe for a container that could not be scrolled or read.
    #[must_use]
    pub fn stuck() -> Self {
        Self::default()
    }
}

/// Which detail panel to wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardTarget<'a> {
    /// The panel keyed to this listing
    Listing(&'a ListingId),
    /// Whatever panel is currently shown
    AnyShown,
}

/// The rendered result list of one search session.
#[async_trait]
pub trait ListPage: Send + Sync {
    /// Identifiers of the list items currently materialized in the DOM, in DOM order.
    async fn rendered_ids(&self) -> Result<Vec<ListingId>>;

    /// Scroll the list container forward by `step_px`.
    async fn scroll_by(&self, step_px: u32) -> Result<ScrollProbe>;

    /// Scroll the list container back to the top.
    async fn reset_scroll(&self) -> Result<()>;

    /// Scroll the item's clickable wrapper into view and click it.
    ///
    /// Returns `Ok(false)` when the item or its wrapper is not rendered.
    async fn open_item(&self, id: &ListingId) -> Result<bool>;

    /// Wait up to `timeout` for a detail panel and return its HTML.
    async fn wait_for_card(
        &self,
        target: CardTarget<'_>,
        timeout: Duration,
    ) -> Result<Option<String>>;

    /// Close consent banners and other overlays covering the list.
    async fn dismiss_popups(&self) -> Result<()> {
        Ok(())
    }

    /// Wait for the first list item after navigation.
    async fn wait_for_results(&self) -> Result<()> {
        Ok(())
    }
}

/// How a captcha wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The challenge is gone and the page can be trusted again
    Resolved,
    /// The wait was given up (stop, timeout, or unrecoverable page state)
    Abandoned,
}

/// Anti-bot interstitial detection and resolution.
#[async_trait]
pub trait CaptchaGate: Send + Sync {
    /// Whether a challenge currently covers the page.
    async fn is_challenge_showing(&self) -> bool;

    /// Block until the challenge is resolved or the wait is abandoned.
    async fn await_resolution(&self, signals: &ControlSignals) -> Resolution;
}

/// A page positioned on search results together with its captcha gate.
#[derive(Clone)]
pub struct Session {
    /// Result list driver
    pub page: Arc<dyn ListPage>,
    /// Interstitial gate bound to the same page
    pub captcha: Arc<dyn CaptchaGate>,
}

/// Produces sessions already navigated to a search URL.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Open `search_url` in a fresh page.
    async fn open_session(&self, search_url: &str) -> Result<Session>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stuck_probe() {
        let probe = ScrollProbe::stuck();
        assert!(!probe.moved);
        assert!(probe.offset.is_none());
        assert!(probe.max_offset.is_none());
    }

    #[test]
    fn test_card_target_equality() {
        let id = ListingId::new("77").expect("valid id");
        assert_eq!(CardTarget::Listing(&id), CardTarget::Listing(&id));
        assert_ne!(CardTarget::Listing(&id), CardTarget::AnyShown);
    }
}
