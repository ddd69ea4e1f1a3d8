//! Chromium adapter for the orgmaps scraper.
//!
//! Launches a browser through chromiumoxide, opens fresh search sessions and
//! exposes them to the scraper as [`MapsPage`] (a `ListPage`) plus a
//! [`ManualCaptchaGate`] that waits for an operator to solve challenges.

pub mod actions;
pub mod captcha;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod page;
pub mod scripts;

pub use actions::BrowserActions;
pub use captcha::{ChallengeProbe, DomChallengeProbe, ManualCaptchaGate};
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use fingerprint::FingerprintConfig;
pub use page::MapsPage;
