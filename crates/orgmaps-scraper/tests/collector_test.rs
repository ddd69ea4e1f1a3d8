//! Card traversal against an in-memory virtualized list.

mod common;

use common::{gate, id, ids, ScriptedCaptcha, VirtualList};
use futures::StreamExt;
use orgmaps_core::{ControlSignals, OrganizationRecord, ScraperConfig};
use orgmaps_scraper::{
    CardCollector, CardParser, CollectorSettings, DiscoverySet, RecordStream, Resolution,
    ScrollDriver,
};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn targets(raw: &[String]) -> DiscoverySet {
    raw.iter().map(|r| id(r)).collect()
}

fn collect(
    page: Arc<VirtualList>,
    signals: &ControlSignals,
    captcha: Arc<ScriptedCaptcha>,
    limit: Option<usize>,
    targets: DiscoverySet,
) -> RecordStream {
    let config = ScraperConfig {
        limit,
        ..ScraperConfig::default()
    };
    collect_with(page, signals, captcha, &config, targets)
}

fn collect_with(
    page: Arc<VirtualList>,
    signals: &ControlSignals,
    captcha: Arc<ScriptedCaptcha>,
    config: &ScraperConfig,
    targets: DiscoverySet,
) -> RecordStream {
    CardCollector::new(
        page,
        gate(signals, captcha),
        ScrollDriver::new(300),
        CardParser::new("yandex.ru"),
        CollectorSettings::from(config),
    )
    .collect(targets)
}

fn card_ids(records: &[OrganizationRecord]) -> HashSet<String> {
    records.iter().map(|r| r.card_url.clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_every_target_yields_exactly_once() {
    let all = ids(0..12);
    let page = Arc::new(VirtualList::new(all.clone(), 4));
    let signals = ControlSignals::new();

    let records: Vec<_> = collect(
        page.clone(),
        &signals,
        ScriptedCaptcha::never(),
        None,
        targets(&all),
    )
    .collect()
    .await;

    assert_eq!(records.len(), 12);
    assert_eq!(card_ids(&records).len(), 12);
    assert_eq!(page.max_open_count(), 1);
    assert_eq!(page.reset_calls.load(Ordering::SeqCst), 1);

    let first = &records[0];
    assert_eq!(first.name, "Org 1000");
    assert_eq!(first.card_url, "https://yandex.ru/maps/org/1000/");
    assert_eq!(first.phone, "+78005553535");
}

#[tokio::test(start_paused = true)]
async fn test_unrendered_panels_are_skipped() {
    let all = ids(0..5);
    let page = Arc::new(VirtualList::new(all.clone(), 5).with_broken_cards(&["1001", "1003"]));
    let signals = ControlSignals::new();

    let records: Vec<_> = collect(
        page.clone(),
        &signals,
        ScriptedCaptcha::never(),
        None,
        targets(&all),
    )
    .collect()
    .await;

    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Org 1000", "Org 1002", "Org 1004"]);
}

#[tokio::test(start_paused = true)]
async fn test_limit_caps_records_and_clicks() {
    let all = ids(0..12);
    let page = Arc::new(VirtualList::new(all.clone(), 4));
    let signals = ControlSignals::new();

    let records: Vec<_> = collect(
        page.clone(),
        &signals,
        ScriptedCaptcha::never(),
        Some(5),
        targets(&all),
    )
    .collect()
    .await;

    assert_eq!(records.len(), 5);
    assert_eq!(page.opened().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_only_discovered_listings_are_opened() {
    let all = ids(0..10);
    let wanted: Vec<String> = all.iter().step_by(2).cloned().collect();
    let page = Arc::new(VirtualList::new(all, 4));
    let signals = ControlSignals::new();

    let records: Vec<_> = collect(
        page.clone(),
        &signals,
        ScriptedCaptcha::never(),
        None,
        targets(&wanted),
    )
    .collect()
    .await;

    assert_eq!(records.len(), wanted.len());
    let opened: HashSet<String> = page.opened().into_iter().collect();
    assert_eq!(opened, wanted.into_iter().collect::<HashSet<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_empty_targets_yield_nothing() {
    let page = Arc::new(VirtualList::new(ids(0..4), 4));
    let signals = ControlSignals::new();

    let records: Vec<_> = collect(
        page.clone(),
        &signals,
        ScriptedCaptcha::never(),
        None,
        DiscoverySet::new(),
    )
    .collect()
    .await;

    assert!(records.is_empty());
    assert!(page.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_ends_stream_after_current_record() {
    let all = ids(0..12);
    let page = Arc::new(VirtualList::new(all.clone(), 4));
    let signals = ControlSignals::new();

    let mut stream = collect(
        page.clone(),
        &signals,
        ScriptedCaptcha::never(),
        None,
        targets(&all),
    );
    assert!(stream.next().await.is_some());
    assert!(stream.next().await.is_some());

    signals.stop();
    let started = Instant::now();
    assert!(stream.next().await.is_none());
    assert!(started.elapsed() <= Duration::from_millis(100));
    assert_eq!(page.opened().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cuts_panel_wait_short() {
    let all = ids(0..5);
    let page = Arc::new(VirtualList::new(all.clone(), 5).with_broken_cards(&["1001"]));
    let signals = ControlSignals::new();

    let mut stream = collect(
        page.clone(),
        &signals,
        ScriptedCaptcha::never(),
        None,
        targets(&all),
    );
    assert!(stream.next().await.is_some());

    let stopper = signals.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stopper.stop();
    });

    let started = Instant::now();
    assert!(stream.next().await.is_none());
    assert!(
        started.elapsed() <= Duration::from_millis(300),
        "stop took {:?}",
        started.elapsed()
    );
    assert_eq!(page.opened(), vec!["1000".to_string(), "1001".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_stall_threshold_allows_extra_rounds() {
    let all = ids(0..3);
    let opens_of_broken = |threshold: u32| {
        let all = all.clone();
        async move {
            // Everything fits on screen, so the list never scrolls.
            let page = Arc::new(VirtualList::new(all.clone(), 5).with_broken_cards(&["1002"]));
            let signals = ControlSignals::new();
            let config = ScraperConfig {
                stall_threshold: threshold,
                ..ScraperConfig::default()
            };

            let records: Vec<_> = collect_with(
                page.clone(),
                &signals,
                ScriptedCaptcha::never(),
                &config,
                targets(&all),
            )
            .collect()
            .await;
            assert_eq!(records.len(), 2);

            let opens = page.opened().iter().filter(|id| *id == "1002").count();
            (opens, page.scroll_calls.load(Ordering::SeqCst))
        }
    };

    // Round one parses two cards, round two is the first stalled round.
    assert_eq!(opens_of_broken(1).await, (2, 2));
    assert_eq!(opens_of_broken(2).await, (3, 3));
}

#[tokio::test(start_paused = true)]
async fn test_pause_delays_but_keeps_records() {
    let all = ids(0..6);
    let page = Arc::new(VirtualList::new(all.clone(), 4));
    let signals = ControlSignals::new();
    signals.pause();

    let resumer = signals.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        resumer.resume();
    });

    let started = Instant::now();
    let records: Vec<_> = collect(
        page.clone(),
        &signals,
        ScriptedCaptcha::never(),
        None,
        targets(&all),
    )
    .collect()
    .await;

    assert_eq!(records.len(), 6);
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_captcha_ends_stream() {
    let all = ids(0..12);
    let page = Arc::new(VirtualList::new(all.clone(), 4));
    let signals = ControlSignals::new();
    // Round check, then three checks per listing: the fourth listing trips it.
    let captcha = ScriptedCaptcha::after(10, Resolution::Abandoned);

    let records: Vec<_> = collect(page.clone(), &signals, captcha.clone(), None, targets(&all))
        .collect()
        .await;

    assert_eq!(records.len(), 3);
    assert_eq!(captcha.resolutions.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resolved_captcha_keeps_collecting() {
    let all = ids(0..8);
    let page = Arc::new(VirtualList::new(all.clone(), 4));
    let signals = ControlSignals::new();
    let captcha = ScriptedCaptcha::after(5, Resolution::Resolved);

    let records: Vec<_> = collect(page.clone(), &signals, captcha.clone(), None, targets(&all))
        .collect()
        .await;

    assert_eq!(records.len(), 8);
    assert_eq!(card_ids(&records).len(), 8);
    assert_eq!(captcha.resolutions.load(Ordering::SeqCst), 1);
}
