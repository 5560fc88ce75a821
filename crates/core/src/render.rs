//! Headless browser rendering fallback.
//!
//! Each render launches its own browser process through a private browser session,
//! which is closed on every exit path: success, error, or timeout. The
//! session never leaves this module.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Browser rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Selectors whose presence signals that the article has rendered
    pub wait_selectors: Vec<String>,
    /// Seconds to wait for a content selector before capturing anyway
    pub wait_timeout: u64,
    /// Scroll steps performed to trigger lazy-loaded content
    pub scroll_steps: u32,
    /// Pause after each scroll step, in milliseconds
    pub scroll_delay_ms: u64,
    /// Hard limit for navigation plus capture, in seconds
    pub timeout: u64,
    pub headless: bool,
    /// Chrome/Chromium binary; detected from PATH when unset
    pub chrome_executable: Option<PathBuf>,
    /// Extra command-line switches for the browser
    pub args: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            wait_selectors: vec!["article".to_string(), "h1".to_string()],
            wait_timeout: 15,
            scroll_steps: 3,
            scroll_delay_ms: 500,
            timeout: 45,
            headless: true,
            chrome_executable: None,
            args: [
                "--no-sandbox",
                "--disable-gpu",
                "--disable-dev-shm-usage",
                "--disable-blink-features=AutomationControlled",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[cfg(feature = "browser")]
pub use browser::BrowserRenderer;

#[cfg(feature = "browser")]
mod browser {
    use std::fmt::Display;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use chromiumoxide::Page;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;
    use tokio::task::JoinHandle;
    use tracing::debug;
    use url::Url;

    use super::RenderConfig;
    use crate::fetch::{FetchedPage, PageFetcher};
    use crate::{EchoscapeError, Result};

    const POLL_INTERVAL: Duration = Duration::from_millis(250);

    /// Renders pages in a fresh headless Chrome per request.
    #[derive(Debug, Clone)]
    pub struct BrowserRenderer {
        config: RenderConfig,
        user_agent: String,
    }

    impl BrowserRenderer {
        pub fn new(config: RenderConfig, user_agent: impl Into<String>) -> Self {
            Self { config, user_agent: user_agent.into() }
        }
    }

    #[async_trait]
    impl PageFetcher for BrowserRenderer {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
            let mut session = BrowserSession::launch(&self.config).await?;

            let outcome = tokio::time::timeout(
                Duration::from_secs(self.config.timeout),
                session.capture(url, &self.config, &self.user_agent),
            )
            .await;

            session.close().await;

            match outcome {
                Ok(html) => Ok(FetchedPage { url: url.to_string(), status: 200, html: html? }),
                Err(_) => Err(EchoscapeError::Timeout { timeout: self.config.timeout }),
            }
        }

        fn name(&self) -> &'static str {
            "browser"
        }
    }

    /// A launched browser process and its event loop.
    ///
    /// Dropping a session aborts the event loop; [`BrowserSession::close`]
    /// also shuts the process down and reaps it.
    struct BrowserSession {
        browser: Browser,
        handler: JoinHandle<()>,
    }

    impl BrowserSession {
        async fn launch(config: &RenderConfig) -> Result<Self> {
            let mut builder = BrowserConfig::builder();
            for arg in &config.args {
                builder = builder.arg(arg.as_str());
            }
            if !config.headless {
                builder = builder.with_head();
            }
            if let Some(path) = &config.chrome_executable {
                builder = builder.chrome_executable(path);
            }

            let browser_config = builder
                .build()
                .map_err(|e| EchoscapeError::Browser(format!("Failed to build browser config: {}", e)))?;

            let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
                EchoscapeError::Browser(format!("Failed to launch browser: {}. Is Chrome or Chromium installed?", e))
            })?;
            debug!("browser launched");

            let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

            Ok(Self { browser, handler })
        }

        /// The page is closed whether or not loading it succeeded.
        async fn capture(&self, url: &Url, config: &RenderConfig, user_agent: &str) -> Result<String> {
            let page = self
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| EchoscapeError::Browser(format!("Failed to create page: {}", e)))?;

            let captured = load_page(&page, url, config, user_agent).await;
            page_outcome(captured, page.close().await, url)
        }

        async fn close(&mut self) {
            if let Err(e) = self.browser.close().await {
                debug!(error = %e, "browser close failed");
            }
            if let Err(e) = self.browser.wait().await {
                debug!(error = %e, "browser wait failed");
            }
            self.handler.abort();
            debug!("browser closed");
        }
    }

    impl Drop for BrowserSession {
        fn drop(&mut self) {
            self.handler.abort();
        }
    }

    async fn load_page(page: &Page, url: &Url, config: &RenderConfig, user_agent: &str) -> Result<String> {
        page.set_user_agent(user_agent)
            .await
            .map_err(|e| EchoscapeError::Browser(format!("Failed to set user agent: {}", e)))?;

        page.goto(url.as_str())
            .await
            .map_err(|e| EchoscapeError::Browser(format!("Navigation failed: {}", e)))?;

        if !wait_for_content(page, config).await {
            debug!(url = %url, "no content selector appeared, capturing anyway");
        }

        for _ in 0..config.scroll_steps {
            if let Err(e) = page.evaluate("window.scrollBy(0, document.body.scrollHeight)").await {
                debug!(error = %e, "scroll step failed");
                break;
            }
            tokio::time::sleep(Duration::from_millis(config.scroll_delay_ms)).await;
        }

        page.content()
            .await
            .map_err(|e| EchoscapeError::Browser(format!("Failed to capture page: {}", e)))
    }

    /// A failed page close is logged and never replaces the capture result.
    pub(super) fn page_outcome<E: Display>(
        captured: Result<String>, closed: std::result::Result<(), E>, url: &Url,
    ) -> Result<String> {
        if let Err(e) = closed {
            debug!(url = %url, error = %e, "page close failed");
        }
        captured
    }

    /// Polls for any wait selector until it appears or the wait times out.
    async fn wait_for_content(page: &Page, config: &RenderConfig) -> bool {
        let deadline = Instant::now() + Duration::from_secs(config.wait_timeout);

        loop {
            for selector in &config.wait_selectors {
                if page.find_element(selector.as_str()).await.is_ok() {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
