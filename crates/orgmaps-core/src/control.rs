//! Session control signals.
//!
//! A controlling context (CLI, UI) owns a [`ControlSignals`] and hands clones
//! to the scraper. Every clone shares the same flags, so setting a flag from
//! one handle is observed by all of them. The scraper only reads the flags and
//! waits on them; it never owns their lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop / pause / captcha-resume flags.
#[derive(Debug, Clone, Default)]
pub struct ControlSignals {
    stop: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
    captcha_resume: Arc<AtomicBool>,
}

impl ControlSignals {
    /// Create a fresh set of cleared signals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the session to stop. One-way: there is no way to clear it.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Pause the traversal at its next suspension point.
    pub fn pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    /// Clear a pause.
    pub fn resume(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }

    /// Whether the traversal is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }

    /// Tell a waiting captcha gate that the operator believes the challenge is solved.
    pub fn request_captcha_resume(&self) {
        self.captcha_resume.store(true, Ordering::SeqCst);
    }

    /// Consume a pending captcha-resume request.
    ///
    /// Returns `true` at most once per request.
    pub fn take_captcha_resume(&self) -> bool {
        self.captcha_resume.swap(false, Ordering::SeqCst)
    }
}
