//! Cooperative interruption checks.
//!
//! Both traversal loops call into one shared [`InterruptionGate`] at every
//! suspension point. The gate reads the externally owned [`ControlSignals`]
//! and blocks on the captcha gate while a challenge is showing.

use crate::page::{CaptchaGate, Resolution};
use orgmaps_core::ControlSignals;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

/// Why a traversal was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The stop signal fired
    Stopped,
    /// A captcha challenge could not be resolved
    CaptchaUnresolved,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("stop requested"),
            Self::CaptchaUnresolved => f.write_str("captcha was not resolved"),
        }
    }
}

/// Result of a gate check: continue, or break out with the reason.
pub type Checkpoint = ControlFlow<Interrupt>;

/// Stop / pause / captcha checks shared by the discovery and collection loops.
pub struct InterruptionGate {
    signals: ControlSignals,
    captcha: Arc<dyn CaptchaGate>,
    pause_poll: Duration,
}

impl InterruptionGate {
    /// Create a gate over the given signals and captcha collaborator.
    #[must_use]
    pub fn new(
        signals: ControlSignals,
        captcha: Arc<dyn CaptchaGate>,
        pause_poll: Duration,
    ) -> Self {
        Self {
            signals,
            captcha,
            pause_poll,
        }
    }

    /// Break with [`Interrupt::Stopped`] if stop has been requested.
    #[must_use]
    pub fn check_stop(&self) -> Checkpoint {
        if self.signals.is_stopped() {
            ControlFlow::Break(Interrupt::Stopped)
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Resolve once stop has been requested, checking every pause poll.
    pub async fn stopped(&self) {
        while !self.signals.is_stopped() {
            tokio::time::sleep(self.pause_poll).await;
        }
    }

    /// Block while paused. Breaks only if stop fires during the pause.
    pub async fn wait_while_paused(&self) -> Checkpoint {
        if self.signals.is_paused() {
            tracing::info!("Paused");
            while self.signals.is_paused() && !self.signals.is_stopped() {
                tokio::time::sleep(self.pause_poll).await;
            }
            if !self.signals.is_stopped() {
                tracing::info!("Resumed");
            }
        }
        self.check_stop()
    }

    /// Check for a captcha interstitial and wait for it to be resolved.
    pub async fn ensure_no_captcha(&self) -> Checkpoint {
        self.check_stop()?;

        if !self.captcha.is_challenge_showing().await {
            return ControlFlow::Continue(());
        }

        tracing::warn!("Captcha challenge detected, waiting for resolution");
        match self.captcha.await_resolution(&self.signals).await {
            Resolution::Resolved => {
                tracing::info!("Captcha resolved, continuing");
                self.check_stop()
            }
            Resolution::Abandoned => {
                if self.signals.is_stopped() {
                    ControlFlow::Break(Interrupt::Stopped)
                } else {
                    ControlFlow::Break(Interrupt::CaptchaUnresolved)
                }
            }
        }
    }

    /// Full suspension-point check: stop, then pause, then captcha.
    pub async fn checkpoint(&self) -> Checkpoint {
        self.check_stop()?;
        self.wait_while_paused().await?;
        self.ensure_no_captcha().await
    }
}
