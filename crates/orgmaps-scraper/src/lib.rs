//! orgmaps Scraper - Discovery and collection over virtualized result lists.
//!
//! This crate enumerates every listing of a map-search result list whose DOM
//! only ever holds a sliding window of items, then opens each listing's
//! detail panel exactly once and parses it into an `OrganizationRecord`.
//!
//! # Features
//!
//! - Scroll-driven id discovery with limit, scroll-saturation and idle termination
//! - Per-listing click / wait / parse traversal with recoverable per-item misses
//! - Cooperative stop, pause and captcha waits at every suspension point
//! - Pull-based record stream: consumers keep what they received if the session aborts
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use orgmaps_core::{AppConfig, ControlSignals};
//! use orgmaps_scraper::MapsScraper;
//! use std::sync::Arc;
//!
//! let scraper = MapsScraper::new(Arc::new(browser_engine), config.scraper, signals.clone());
//! let mut records = scraper.run("кофейня в Казани").await?;
//! while let Some(record) = records.next().await {
//!     println!("{}", record.name);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod collector;
#[allow(missing_docs)]
pub mod discovery;
#[allow(missing_docs)]
pub mod error;
pub mod gate;
#[allow(missing_docs)]
pub mod normalize;
pub mod orchestrator;
pub mod page;
#[allow(missing_docs)]
pub mod parser;
#[allow(missing_docs)]
pub mod scroll;
#[allow(missing_docs)]
pub mod url_builder;

// Re-export commonly used types
pub use collector::{CardCollector, CollectorSettings, ParsedSet, RecordStream};
pub use discovery::{
    DiscoveryFinish, DiscoveryReport, DiscoverySet, DiscoverySettings, IdDiscoveryEngine,
};
pub use error::{Result, ScrapeError};
pub use gate::{Checkpoint, Interrupt, InterruptionGate};
pub use orchestrator::MapsScraper;
pub use page::{
    CaptchaGate, CardTarget, ListPage, Resolution, ScrollProbe, Session, SessionProvider,
};
pub use parser::{CardDocument, CardParser, SocialLinks};
pub use scroll::ScrollDriver;
pub use url_builder::build_search_url;
