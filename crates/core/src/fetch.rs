//! Page retrieval from URLs, files, and stdin.
//!
//! Network retrieval goes through the [`PageFetcher`] trait so the pipeline
//! can swap the lightweight HTTP client, the headless browser, or a test stub.
//! This module also holds the retrieval policies: URL normalization,
//! bot-interdiction detection and the hard-paywall allow-list.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{EchoscapeError, Result};

/// A realistic desktop Chrome User-Agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// HTTP retrieval configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Hard-paywall publishers; only metadata is resolved for these.
    pub paywall_domains: Vec<String>,
    /// Case-insensitive substrings that identify an anti-bot challenge page.
    pub bot_markers: Vec<String>,
    /// Fall back to browser rendering when the lightweight fetch is insufficient.
    pub render_fallback: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 12,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            paywall_domains: vec!["nytimes.com".to_string(), "wsj.com".to_string(), "ft.com".to_string()],
            bot_markers: [
                "captcha-delivery.com",
                "cf-browser-verification",
                "_cf_chl_opt",
                "px-captcha",
                "Pardon Our Interruption",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            render_fallback: true,
        }
    }
}

/// A retrieved page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    /// HTTP status code (200 for rendered pages).
    pub status: u16,
    pub html: String,
}

impl FetchedPage {
    /// Whether the response status was 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retrieves raw HTML for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Lightweight fetcher: a single HTTP GET with browser-like headers.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(&config.user_agent)
            .build()
            .map_err(EchoscapeError::HttpError)?;

        Ok(Self { client, timeout: config.timeout })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() { EchoscapeError::Timeout { timeout: self.timeout } } else { EchoscapeError::HttpError(e) }
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let html = response.text().await.map_err(|e| {
            if e.is_timeout() { EchoscapeError::Timeout { timeout: self.timeout } } else { EchoscapeError::HttpError(e) }
        })?;

        Ok(FetchedPage { url: final_url, status, html })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Fetches HTML from a URL with a one-off client.
///
/// Returns the body regardless of status code.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed = normalize_url(url)?;
    let page = HttpFetcher::new(config)?.fetch(&parsed).await?;
    Ok(page.html)
}

/// Parses a URL, requiring an http(s) scheme and dropping any fragment.
pub fn normalize_url(url: &str) -> Result<Url> {
    let mut parsed = Url::parse(url.trim()).map_err(|e| EchoscapeError::InvalidUrl(format!("{url}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(EchoscapeError::InvalidUrl(format!("{url}: URL must use http:// or https://")));
    }

    parsed.set_fragment(None);
    Ok(parsed)
}

/// Returns the first configured bot marker found in `html`.
pub fn detect_bot_marker<'a>(html: &str, markers: &'a [String]) -> Option<&'a str> {
    let haystack = html.to_lowercase();
    markers
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .find(|m| haystack.contains(&m.to_lowercase()))
}

/// Whether `url` belongs to an allow-listed hard-paywall publisher.
///
/// Matches the domain itself and any subdomain of it.
pub fn is_paywalled(url: &Url, domains: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_lowercase();

    domains.iter().any(|domain| {
        let domain = domain.trim().trim_start_matches('.').to_lowercase();
        !domain.is_empty() && (host == domain || host.ends_with(&format!(".{domain}")))
    })
}

/// Reads HTML content from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(EchoscapeError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(EchoscapeError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(EchoscapeError::from)?;

    Ok(buffer)
}
