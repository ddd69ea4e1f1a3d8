use crate::error::Result;
use std::time::Duration;

/// Browser actions for automation
#[async_trait::async_trait]
pub trait BrowserActions {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait for a selector to appear
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Evaluate a script and return its JSON value
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Outer HTML of the first match, if any
    async fn outer_html(&self, selector: &str) -> Result<Option<String>>;
}
