//! Captcha detection and the operator-driven resolution wait.
//!
//! Challenges are never solved automatically. The gate logs a warning and
//! polls until the interstitial disappears, the operator signals that it was
//! handled, stop is requested, or the optional timeout runs out.

use crate::page::MapsPage;
use crate::scripts;
use crate::BrowserActions;
use async_trait::async_trait;
use orgmaps_core::{CaptchaConfig, ControlSignals};
use orgmaps_scraper::{CaptchaGate, Resolution};
use std::time::Duration;
use tokio::time::Instant;

/// Answers whether a challenge is currently showing.
#[async_trait]
pub trait ChallengeProbe: Send + Sync {
    async fn challenge_present(&self) -> bool;
}

/// DOM / URL based detection on a live page.
pub struct DomChallengeProbe {
    page: MapsPage,
    script: String,
}

impl DomChallengeProbe {
    pub fn new(page: MapsPage, config: &CaptchaConfig) -> Self {
        Self {
            page,
            script: scripts::captcha_present(&config.selectors, &config.url_marker),
        }
    }
}

#[async_trait]
impl ChallengeProbe for DomChallengeProbe {
    async fn challenge_present(&self) -> bool {
        match self.page.evaluate(&self.script).await {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => {
                tracing::debug!("Captcha probe failed: {}", e);
                false
            }
        }
    }
}

/// Waits for a human to clear the challenge in the browser window.
pub struct ManualCaptchaGate<P> {
    probe: P,
    poll: Duration,
    timeout: Option<Duration>,
}

impl<P: ChallengeProbe> ManualCaptchaGate<P> {
    pub fn new(probe: P, config: &CaptchaConfig) -> Self {
        Self {
            probe,
            poll: Duration::from_millis(config.poll_ms),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[async_trait]
impl<P: ChallengeProbe> CaptchaGate for ManualCaptchaGate<P> {
    async fn is_challenge_showing(&self) -> bool {
        self.probe.challenge_present().await
    }

    async fn await_resolution(&self, signals: &ControlSignals) -> Resolution {
        tracing::warn!(
            "Captcha detected. Solve it in the browser window, then send `captcha` to continue"
        );
        let started = Instant::now();

        loop {
            if signals.is_stopped() {
                tracing::info!("Stop requested while waiting for captcha");
                return Resolution::Abandoned;
            }

            if signals.take_captcha_resume() {
                tracing::info!("Captcha resume requested, checking the page");
                if !self.probe.challenge_present().await {
                    return Resolution::Resolved;
                }
                tracing::warn!("Captcha is still showing");
            } else if !self.probe.challenge_present().await {
                return Resolution::Resolved;
            }

            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    tracing::warn!(
                        "Captcha not resolved within {}s, giving up",
                        timeout.as_secs()
                    );
                    return Resolution::Abandoned;
                }
            }

            tokio::time::sleep(self.poll).await;
        }
    }
}
