use crate::actions::BrowserActions;
use crate::captcha::{DomChallengeProbe, ManualCaptchaGate};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use crate::page::MapsPage;
use crate::scripts;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::browser::ResetPermissionsParams;
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use orgmaps_core::{AppConfig, BrowserConfig, CaptchaConfig, SelectorConfig};
use orgmaps_scraper::{ScrapeError, Session, SessionProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Browser automation engine
pub struct BrowserEngine {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    fingerprint: FingerprintConfig,
    config: BrowserConfig,
    selectors: SelectorConfig,
    captcha: CaptchaConfig,
}

impl BrowserEngine {
    /// Launch Chromium with the browser, selector and captcha settings of `config`.
    pub async fn launch(config: &AppConfig) -> Result<Self> {
        let fingerprint = if config.browser.randomize_fingerprint {
            FingerprintConfig::randomized()
        } else {
            FingerprintConfig::desktop(config.browser.window_width, config.browser.window_height)
        };
        Self::with_fingerprint(config, fingerprint).await
    }

    /// Launch Chromium presenting a specific fingerprint.
    pub async fn with_fingerprint(
        config: &AppConfig,
        fingerprint: FingerprintConfig,
    ) -> Result<Self> {
        let chrome_config = Self::chrome_config(&config.browser, &fingerprint)?;

        tracing::info!(
            headless = config.browser.headless,
            width = fingerprint.viewport_width,
            height = fingerprint.viewport_height,
            "Launching browser"
        );
        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            fingerprint,
            config: config.browser.clone(),
            selectors: config.selectors.clone(),
            captcha: config.captcha.clone(),
        })
    }

    fn chrome_config(
        browser: &BrowserConfig,
        fingerprint: &FingerprintConfig,
    ) -> Result<ChromeConfig> {
        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .viewport(Viewport {
                width: fingerprint.viewport_width,
                height: fingerprint.viewport_height,
                device_scale_factor: Some(1.0),
                ..Viewport::default()
            })
            .request_timeout(Duration::from_secs(browser.navigation_timeout_secs))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--lang=ru-RU");

        if !browser.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &browser.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(BrowserError::ChromiumError)
    }

    /// Open a tab with a clean session and navigate it to `url`.
    pub async fn open_page(&self, url: &str) -> Result<MapsPage> {
        let host = extract_domain(url)?;
        let page = self.browser.lock().await.new_page("about:blank").await?;
        self.reset_session(&page).await?;

        let maps_page = MapsPage::new(page, self.selectors.clone()).with_timeouts(
            Duration::from_secs(self.config.navigation_timeout_secs),
            Duration::from_secs(self.config.results_timeout_secs),
        );

        tracing::info!(host = %host, "Opening search page: {}", url);
        let started = tokio::time::Instant::now();
        maps_page.navigate(url).await?;
        tracing::info!(
            "Search page opened in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        Ok(maps_page)
    }

    /// Clear cookies and permissions, wipe storage on every document and set the identity.
    async fn reset_session(&self, page: &Page) -> Result<()> {
        tracing::info!("Clearing cookies, permissions and storage for a new session");
        if let Err(e) = page.execute(ClearBrowserCookiesParams::default()).await {
            tracing::warn!("Failed to clear cookies: {}", e);
        }
        if let Err(e) = page.execute(ResetPermissionsParams::default()).await {
            tracing::warn!("Failed to clear permissions: {}", e);
        }

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(scripts::RESET_STORAGE))
            .await?;

        let mut user_agent = SetUserAgentOverrideParams::new(self.fingerprint.user_agent.clone());
        user_agent.accept_language = Some(self.fingerprint.accept_language.clone());
        page.execute(user_agent).await?;
        Ok(())
    }

    /// Close the browser.
    pub async fn close(&self) -> Result<()> {
        self.browser.lock().await.close().await?;
        tracing::info!("Browser closed");
        Ok(())
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl SessionProvider for BrowserEngine {
    async fn open_session(&self, search_url: &str) -> orgmaps_scraper::Result<Session> {
        let page = self
            .open_page(search_url)
            .await
            .map_err(|e| ScrapeError::Session(e.to_string()))?;
        let probe = DomChallengeProbe::new(page.clone(), &self.captcha);
        let captcha = ManualCaptchaGate::new(probe, &self.captcha);

        Ok(Session {
            page: Arc::new(page),
            captcha: Arc::new(captcha),
        })
    }
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(|s| s.to_string())
}
