//! Configuration management for orgmaps.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/orgmaps/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Discovery and collection tuning
    pub scraper: ScraperConfig,
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// DOM selectors for the list and detail panel
    pub selectors: SelectorConfig,
    /// Captcha interstitial handling
    pub captcha: CaptchaConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML or fail validation
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `ORGMAPS_HEADLESS`: Override browser headless mode (true/false)
    /// - `ORGMAPS_LIMIT`: Override the record limit (0 = unlimited)
    /// - `ORGMAPS_LOG_LEVEL`: Override the log filter
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `ORGMAPS_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ORGMAPS_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("ORGMAPS_LIMIT") {
            if let Ok(limit) = val.parse::<usize>() {
                self.scraper.limit = (limit > 0).then_some(limit);
                tracing::debug!("Override scraper.limit from env: {}", limit);
            }
        }

        if let Ok(val) = std::env::var("ORGMAPS_LOG_LEVEL") {
            if !val.trim().is_empty() {
                tracing::debug!("Override logging.level from env: {}", val);
                self.logging.level = val;
            }
        }
    }

    /// Check values that would make the traversal loops misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        let s = &self.scraper;
        let positive = [
            ("scraper.scroll_step_px", u64::from(s.scroll_step_px)),
            ("scraper.card_timeout_ms", s.card_timeout_ms),
            ("scraper.pause_poll_ms", s.pause_poll_ms),
            ("scraper.idle_poll_min_ms", s.idle_poll_min_ms),
            ("scraper.stall_threshold", u64::from(s.stall_threshold)),
            ("scraper.saturation_rounds", u64::from(s.saturation_rounds)),
            ("captcha.poll_ms", self.captcha.poll_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if s.idle_poll_max_ms < s.idle_poll_min_ms {
            return Err(ConfigError::InvalidValue {
                field: "scraper.idle_poll_max_ms".to_string(),
                reason: "must not be lower than idle_poll_min_ms".to_string(),
            });
        }

        if s.limit == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "scraper.limit".to_string(),
                reason: "use no limit instead of zero".to_string(),
            });
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/orgmaps/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "orgmaps", "orgmaps").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Discovery and collection tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Search page base URL; the query is appended as `?text=`
    pub base_url: String,
    /// Host used to build canonical detail URLs
    pub host: String,
    /// Maximum number of records (None = unlimited)
    pub limit: Option<usize>,
    /// Pixels scrolled per round
    pub scroll_step_px: u32,
    /// Settle time after each scroll, lower bound (ms)
    pub scroll_settle_min_ms: u64,
    /// Settle time after each scroll, upper bound (ms)
    pub scroll_settle_max_ms: u64,
    /// Discovery stops waiting for scroll movement after this long (ms)
    pub idle_timeout_ms: u64,
    /// Bounded wait for late-arriving items once idle (ms)
    pub idle_wait_ms: u64,
    /// Poll interval during the idle wait, lower bound (ms)
    pub idle_poll_min_ms: u64,
    /// Poll interval during the idle wait, upper bound (ms)
    pub idle_poll_max_ms: u64,
    /// Identical scroll offsets in a row that mean the list is exhausted
    pub saturation_rounds: u32,
    /// Timeout for a detail panel to render, applied to each selector (ms)
    pub card_timeout_ms: u64,
    /// Stalled collection rounds tolerated before giving up
    pub stall_threshold: u32,
    /// Poll interval while paused (ms)
    pub pause_poll_ms: u64,
    /// Delay between collection rounds, lower bound (ms)
    pub round_delay_min_ms: u64,
    /// Delay between collection rounds, upper bound (ms)
    pub round_delay_max_ms: u64,
}

impl ScraperConfig {
    /// Idle timeout as a `Duration`.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Idle wait as a `Duration`.
    #[must_use]
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    /// Card timeout as a `Duration`.
    #[must_use]
    pub fn card_timeout(&self) -> Duration {
        Duration::from_millis(self.card_timeout_ms)
    }

    /// Pause poll interval as a `Duration`.
    #[must_use]
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://yandex.ru/web-maps/".to_string(),
            host: "yandex.ru".to_string(),
            limit: None,
            scroll_step_px: 1200,
            scroll_settle_min_ms: 150,
            scroll_settle_max_ms: 250,
            idle_timeout_ms: 10_000,
            idle_wait_ms: 10_000,
            idle_poll_min_ms: 300,
            idle_poll_max_ms: 500,
            saturation_rounds: 3,
            card_timeout_ms: 2000,
            stall_threshold: 1,
            pause_poll_ms: 100,
            round_delay_min_ms: 200,
            round_delay_max_ms: 400,
        }
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// How long to wait for the first list item after navigation, in seconds
    pub results_timeout_secs: u64,
    /// Pick a random user agent / viewport instead of the fixed desktop profile
    pub randomize_fingerprint: bool,
    /// Explicit Chrome/Chromium executable
    pub executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 20,
            results_timeout_secs: 30,
            randomize_fingerprint: false,
            executable: None,
        }
    }
}

/// DOM selectors for the results list and detail panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Scrollable container of the virtualized list
    pub scroll_container: String,
    /// One rendered list item; must carry `data-id`
    pub list_item: String,
    /// Clickable wrapper inside a list item
    pub list_item_wrapper: String,
    /// Shown detail panel; the id-keyed variant appends `[data-id='<id>']`
    pub card: String,
    /// Consent / close buttons tried once after navigation, matched by label
    pub popup_button_labels: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            scroll_container: "div.scroll__container".to_string(),
            list_item: "div.search-snippet-view__body[data-object='search-list-item'][data-id]"
                .to_string(),
            list_item_wrapper:
                "div.search-snippet-view__body-button-wrapper[role='button'][tabindex='0']"
                    .to_string(),
            card: "aside.sidebar-view._shown div.business-card-view".to_string(),
            popup_button_labels: ["Принять", "Согласен", "Отклонить", "Закрыть"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Captcha interstitial handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Poll interval while waiting for a challenge to be solved (ms)
    pub poll_ms: u64,
    /// Give up waiting after this many seconds (None = wait until stopped)
    pub timeout_secs: Option<u64>,
    /// Elements whose presence means a challenge is showing
    pub selectors: Vec<String>,
    /// URL fragment that identifies the challenge page
    pub url_marker: String,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            poll_ms: 1000,
            timeout_secs: None,
            selectors: vec![
                "form#checkbox-captcha-form".to_string(),
                ".CheckboxCaptcha".to_string(),
                ".AdvancedCaptcha".to_string(),
                ".SmartCaptcha".to_string(),
            ],
            url_marker: "showcaptcha".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub level: String,
    /// Also append plain-text logs to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,orgmaps=debug".to_string(),
            file: None,
        }
    }
}
