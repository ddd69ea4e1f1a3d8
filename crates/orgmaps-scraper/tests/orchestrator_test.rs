//! End-to-end runs of `MapsScraper` over fake sessions.

mod common;

use common::{ids, FakeProvider, ScriptedCaptcha, VirtualList};
use futures::StreamExt;
use orgmaps_core::{ControlSignals, ScraperConfig};
use orgmaps_scraper::{MapsScraper, Resolution, ScrapeError};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn config() -> ScraperConfig {
    ScraperConfig {
        scroll_step_px: 300,
        ..ScraperConfig::default()
    }
}

fn scraper(provider: Arc<FakeProvider>, signals: ControlSignals) -> MapsScraper {
    MapsScraper::new(provider, config(), signals)
}

#[tokio::test(start_paused = true)]
async fn test_run_collects_whole_list() {
    let page = Arc::new(VirtualList::new(ids(0..8), 4));
    let provider = Arc::new(FakeProvider::new(page.clone(), ScriptedCaptcha::never()));

    let stream = scraper(provider.clone(), ControlSignals::new())
        .run("кофейня")
        .await
        .expect("session should open");
    let records: Vec<_> = stream.collect().await;

    assert_eq!(records.len(), 8);
    let urls: HashSet<_> = records.iter().map(|r| r.card_url.as_str()).collect();
    assert_eq!(urls.len(), 8);

    let opened = provider.opened_urls.lock().expect("opened urls").clone();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].starts_with("https://yandex.ru/web-maps/?text="));
}

#[tokio::test(start_paused = true)]
async fn test_run_respects_limit_override() {
    let page = Arc::new(VirtualList::new(ids(0..20), 4));
    let provider = Arc::new(FakeProvider::new(page.clone(), ScriptedCaptcha::never()));

    let records: Vec<_> = scraper(provider, ControlSignals::new())
        .with_limit(Some(3))
        .run("аптека")
        .await
        .expect("session should open")
        .collect()
        .await;

    assert_eq!(records.len(), 3);
    assert_eq!(page.opened().len(), 3);
}

#[tokio::test]
async fn test_run_rejects_empty_query() {
    let page = Arc::new(VirtualList::new(ids(0..3), 4));
    let provider = Arc::new(FakeProvider::new(page, ScriptedCaptcha::never()));

    let result = scraper(provider.clone(), ControlSignals::new())
        .run("  ")
        .await;

    assert!(matches!(result, Err(ScrapeError::EmptyQuery)));
    assert!(provider.opened_urls.lock().expect("opened urls").is_empty());
}

#[tokio::test]
async fn test_session_failure_is_returned() {
    let page = Arc::new(VirtualList::new(ids(0..3), 4));
    let mut provider = FakeProvider::new(page, ScriptedCaptcha::never());
    provider.fail = true;

    let result = scraper(Arc::new(provider), ControlSignals::new())
        .run("кафе")
        .await;

    assert!(matches!(result, Err(ScrapeError::Session(_))));
}

#[tokio::test]
async fn test_missing_results_are_returned() {
    let page = Arc::new(VirtualList::new(ids(0..3), 4).with_failing_results());
    let provider = Arc::new(FakeProvider::new(page, ScriptedCaptcha::never()));

    let result = scraper(provider, ControlSignals::new()).run("кафе").await;

    assert!(matches!(result, Err(ScrapeError::Page(_))));
}

#[tokio::test(start_paused = true)]
async fn test_captcha_on_landing_yields_empty_stream() {
    let page = Arc::new(VirtualList::new(ids(0..8), 4));
    let captcha = ScriptedCaptcha::after(0, Resolution::Abandoned);
    let provider = Arc::new(FakeProvider::new(page.clone(), captcha));

    let records: Vec<_> = scraper(provider, ControlSignals::new())
        .run("кафе")
        .await
        .expect("captcha is not an error")
        .collect()
        .await;

    assert!(records.is_empty());
    assert_eq!(page.scroll_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_run_yields_empty_stream() {
    let page = Arc::new(VirtualList::new(ids(0..8), 4));
    let provider = Arc::new(FakeProvider::new(page.clone(), ScriptedCaptcha::never()));
    let signals = ControlSignals::new();
    signals.stop();

    let records: Vec<_> = scraper(provider, signals)
        .run("кафе")
        .await
        .expect("stop is not an error")
        .collect()
        .await;

    assert!(records.is_empty());
    assert!(page.opened().is_empty());
}
