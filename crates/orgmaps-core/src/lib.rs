//! orgmaps Core - Foundation crate for the orgmaps listing scraper.
//!
//! This crate provides shared types, error handling, configuration management
//! and the session control signals that the browser and scraper crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and records (`ListingId`, `OrganizationRecord`, `VerificationTier`)
//! - [`control`] - Stop / pause / captcha-resume flags shared with a controlling context
//!
//! # Example
//!
//! ```rust
//! use orgmaps_core::{AppConfig, ControlSignals};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.scraper.scroll_step_px, 1200);
//!
//! let signals = ControlSignals::new();
//! signals.pause();
//! assert!(signals.is_paused());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod control;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, CaptchaConfig, LoggingConfig, ScraperConfig, SelectorConfig,
};
pub use control::ControlSignals;
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use types::{ListingId, OrganizationRecord, VerificationTier};
