//! In-memory stand-ins for a rendered result list and its captcha gate.

#![allow(dead_code)]

use async_trait::async_trait;
use orgmaps_core::{ControlSignals, ListingId};
use orgmaps_scraper::{
    CaptchaGate, CardTarget, InterruptionGate, ListPage, Resolution, ScrapeError, ScrollProbe,
    Session, SessionProvider,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ITEM_HEIGHT: i64 = 100;

/// Items rendered below the viewport edge.
const OVERSCAN: usize = 1;

pub fn id(raw: &str) -> ListingId {
    ListingId::new(raw).expect("valid listing id")
}

pub fn ids(range: std::ops::Range<u32>) -> Vec<String> {
    range.map(|n| (1000 + n).to_string()).collect()
}

pub fn card_html(id: &str) -> String {
    format!(
        r#"<div class="business-card-view" data-id="{id}">
            <h1 class="card-title-view__title">
                <a class="card-title-view__title-link" href="/maps/org/org_{id}/{id}/">Org {id}</a>
            </h1>
            <span itemprop="telephone">8 800 555-35-35</span>
        </div>"#
    )
}

#[derive(Default)]
struct ListState {
    items: Vec<String>,
    offset: i64,
    selected: Option<String>,
    samples: usize,
    late: Vec<String>,
    late_after_samples: usize,
    trickle: VecDeque<String>,
}

/// A virtualized list: only `window` consecutive items (plus overscan) are
/// rendered at the current scroll offset.
pub struct VirtualList {
    state: Mutex<ListState>,
    window: usize,
    broken_cards: HashSet<String>,
    lying_scroll: bool,
    fail_results: bool,
    pub scroll_calls: AtomicUsize,
    pub reset_calls: AtomicUsize,
    pub opened: Mutex<Vec<String>>,
    open_counts: Mutex<HashMap<String, usize>>,
}

impl VirtualList {
    pub fn new(items: Vec<String>, window: usize) -> Self {
        Self {
            state: Mutex::new(ListState {
                items,
                ..ListState::default()
            }),
            window,
            broken_cards: HashSet::new(),
            lying_scroll: false,
            fail_results: false,
            scroll_calls: AtomicUsize::new(0),
            reset_calls: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
            open_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Detail panels of these ids never render.
    pub fn with_broken_cards(mut self, ids: &[&str]) -> Self {
        self.broken_cards = ids.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Report `moved = true` on every scroll, even when the offset is stuck.
    pub fn with_lying_scroll(mut self) -> Self {
        self.lying_scroll = true;
        self
    }

    /// Append `late` items once the rendered ids have been sampled `after` times.
    pub fn with_late_items(self, late: Vec<String>, after: usize) -> Self {
        {
            let mut state = self.state.lock().expect("list state");
            state.late = late;
            state.late_after_samples = after;
        }
        self
    }

    /// Append one of `items` on every sample of the rendered ids.
    pub fn with_trickle(self, items: Vec<String>) -> Self {
        self.state.lock().expect("list state").trickle = items.into();
        self
    }

    pub fn with_failing_results(mut self) -> Self {
        self.fail_results = true;
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opened").clone()
    }

    pub fn max_open_count(&self) -> usize {
        self.open_counts
            .lock()
            .expect("open counts")
            .values()
            .copied()
            .max()
            .unwrap_or(0)
    }

    fn max_offset(&self, state: &ListState) -> i64 {
        let hidden = state.items.len().saturating_sub(self.window);
        i64::try_from(hidden).expect("small list") * ITEM_HEIGHT
    }

    fn rendered(&self, state: &ListState) -> Vec<String> {
        let first = usize::try_from(state.offset / ITEM_HEIGHT).expect("non-negative offset");
        state
            .items
            .iter()
            .skip(first)
            .take(self.window + OVERSCAN)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ListPage for VirtualList {
    async fn rendered_ids(&self) -> orgmaps_scraper::Result<Vec<ListingId>> {
        let mut state = self.state.lock().expect("list state");
        state.samples += 1;
        if !state.late.is_empty() && state.samples >= state.late_after_samples {
            let late = std::mem::take(&mut state.late);
            state.items.extend(late);
        }
        if let Some(next) = state.trickle.pop_front() {
            state.items.push(next);
        }
        Ok(self.rendered(&state).iter().map(|raw| id(raw)).collect())
    }

    async fn scroll_by(&self, step_px: u32) -> orgmaps_scraper::Result<ScrollProbe> {
        self.scroll_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().expect("list state");
        let max = self.max_offset(&state);
        let prev = state.offset;
        state.offset = (prev + i64::from(step_px)).min(max);
        Ok(ScrollProbe {
            moved: self.lying_scroll || state.offset > prev,
            offset: Some(state.offset),
            max_offset: Some(max),
        })
    }

    async fn reset_scroll(&self) -> orgmaps_scraper::Result<()> {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().expect("list state").offset = 0;
        Ok(())
    }

    async fn open_item(&self, id: &ListingId) -> orgmaps_scraper::Result<bool> {
        let mut state = self.state.lock().expect("list state");
        if !self.rendered(&state).iter().any(|raw| raw == id.as_str()) {
            return Ok(false);
        }
        state.selected = Some(id.to_string());
        self.opened.lock().expect("opened").push(id.to_string());
        *self
            .open_counts
            .lock()
            .expect("open counts")
            .entry(id.to_string())
            .or_default() += 1;
        Ok(true)
    }

    async fn wait_for_card(
        &self,
        target: CardTarget<'_>,
        timeout: Duration,
    ) -> orgmaps_scraper::Result<Option<String>> {
        let shown = {
            let state = self.state.lock().expect("list state");
            state
                .selected
                .clone()
                .filter(|selected| !self.broken_cards.contains(selected))
                .filter(|selected| match target {
                    CardTarget::Listing(id) => id.as_str() == selected,
                    CardTarget::AnyShown => true,
                })
        };

        match shown {
            Some(selected) => Ok(Some(card_html(&selected))),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }

    async fn wait_for_results(&self) -> orgmaps_scraper::Result<()> {
        if self.fail_results {
            Err(ScrapeError::Page("results did not appear".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Captcha gate that starts showing a challenge after a number of checks.
pub struct ScriptedCaptcha {
    show_after_checks: Option<usize>,
    outcome: Resolution,
    checks: AtomicUsize,
    pub resolutions: AtomicUsize,
    solved: Mutex<bool>,
}

impl ScriptedCaptcha {
    pub fn never() -> Arc<Self> {
        Self::build(None, Resolution::Resolved)
    }

    pub fn after(checks: usize, outcome: Resolution) -> Arc<Self> {
        Self::build(Some(checks), outcome)
    }

    fn build(show_after_checks: Option<usize>, outcome: Resolution) -> Arc<Self> {
        Arc::new(Self {
            show_after_checks,
            outcome,
            checks: AtomicUsize::new(0),
            resolutions: AtomicUsize::new(0),
            solved: Mutex::new(false),
        })
    }
}

#[async_trait]
impl CaptchaGate for ScriptedCaptcha {
    async fn is_challenge_showing(&self) -> bool {
        let checks = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        let solved = *self.solved.lock().expect("solved flag");
        self.show_after_checks
            .is_some_and(|after| checks > after && !solved)
    }

    async fn await_resolution(&self, _signals: &ControlSignals) -> Resolution {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        if self.outcome == Resolution::Resolved {
            *self.solved.lock().expect("solved flag") = true;
        }
        self.outcome
    }
}

pub fn gate(signals: &ControlSignals, captcha: Arc<ScriptedCaptcha>) -> Arc<InterruptionGate> {
    Arc::new(InterruptionGate::new(
        signals.clone(),
        captcha,
        Duration::from_millis(100),
    ))
}

/// Hands out one prepared session.
pub struct FakeProvider {
    pub page: Arc<VirtualList>,
    pub captcha: Arc<ScriptedCaptcha>,
    pub opened_urls: Mutex<Vec<String>>,
    pub fail: bool,
}

impl FakeProvider {
    pub fn new(page: Arc<VirtualList>, captcha: Arc<ScriptedCaptcha>) -> Self {
        Self {
            page,
            captcha,
            opened_urls: Mutex::new(Vec::new()),
            fail: false,
        }
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn open_session(&self, search_url: &str) -> orgmaps_scraper::Result<Session> {
        self.opened_urls
            .lock()
            .expect("opened urls")
            .push(search_url.to_string());
        if self.fail {
            return Err(ScrapeError::Session("browser not available".to_string()));
        }
        Ok(Session {
            page: self.page.clone(),
            captcha: self.captcha.clone(),
        })
    }
}
