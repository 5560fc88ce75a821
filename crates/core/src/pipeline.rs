//! Main extraction API.
//!
//! This module provides the two entry points of the crate through the
//! [`Pipeline`] struct, along with the one-shot functions
//! [`extract_from_html`] and [`extract_from_url`].
//!
//! # Example
//!
//! ```rust,no_run
//! use echoscape_core::pipeline::extract_from_url;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let result = extract_from_url("https://example.com/news/story").await?;
//! if result.has_body() {
//!     println!("{}\n\n{}", result.title, result.body_text);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::article::{ExtractionResult, host_of};
use crate::clean::Cleaner;
use crate::config::PipelineConfig;
use crate::extract::{ExtractionStrategy, Extractor, structured_body};
use crate::fetch::{FetchedPage, HttpFetcher, PageFetcher, detect_bot_marker, is_paywalled, normalize_url};
use crate::metadata::{Metadata, NO_TITLE};
use crate::parse::Document;
use crate::{EchoscapeError, Result};

/// Fetch, sanitize, extract, clean and resolve metadata.
///
/// A pipeline is immutable once built and can be shared across tasks.
///
/// # Example
///
/// ```rust
/// use echoscape_core::{ExtractionStrategy, Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder().render_fallback(false).build();
/// let pipeline = Pipeline::with_config(config).unwrap();
///
/// let body = "Council members voted on the new transit budget. ".repeat(8);
/// let html = format!("<html><head><title>Budget</title></head><body><article><p>{body}</p></article></body></html>");
/// let result = pipeline.extract_from_html(&html, Some("https://example.com/budget")).unwrap();
///
/// assert_eq!(result.title, "Budget");
/// assert_eq!(result.extraction_strategy, ExtractionStrategy::KnownSelector);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    extractor: Extractor,
    cleaner: Cleaner,
    fetcher: Arc<dyn PageFetcher>,
    renderer: Option<Arc<dyn PageFetcher>>,
}

impl Pipeline {
    /// Creates a pipeline with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(PipelineConfig::default())
    }

    /// Creates a pipeline with the HTTP fetcher and, when the `browser`
    /// feature is enabled, the headless browser fallback.
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.fetch)?);
        let renderer = default_renderer(&config);
        Ok(Self::with_fetchers(config, fetcher, renderer))
    }

    /// Creates a pipeline with explicit retrieval strategies.
    pub fn with_fetchers(
        config: PipelineConfig, fetcher: Arc<dyn PageFetcher>, renderer: Option<Arc<dyn PageFetcher>>,
    ) -> Self {
        let extractor = Extractor::new(&config.extract);
        let cleaner = Cleaner::new(&config.clean);
        Self { config, extractor, cleaner, fetcher, renderer }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extracts an article from HTML the caller already has.
    ///
    /// # Errors
    ///
    /// - [`EchoscapeError::InvalidUrl`] if `source_url` is not an http(s) URL.
    /// - [`EchoscapeError::BotBlocked`] if the HTML is an anti-bot challenge.
    pub fn extract_from_html(&self, html: &str, source_url: Option<&str>) -> Result<ExtractionResult> {
        let url = source_url.map(normalize_url).transpose()?;
        let label = url.as_ref().map_or_else(|| "<html>".to_string(), Url::to_string);

        self.check_bot_markers(html, &label)?;

        let doc = Document::parse(html)?;
        Ok(self.extract_document(&doc, url.map(String::from)))
    }

    /// Fetches a URL and extracts its article.
    ///
    /// Hard-paywall domains only get metadata. Otherwise a lightweight fetch
    /// is tried first; when it fails, returns an error status, or yields too
    /// little text, the page is rendered once in a headless browser.
    ///
    /// # Errors
    ///
    /// - [`EchoscapeError::InvalidUrl`] for malformed or non-http(s) URLs.
    /// - [`EchoscapeError::BotBlocked`] when either stage served a challenge page.
    /// - [`EchoscapeError::Unreachable`] when no stage produced a usable response.
    pub async fn extract_from_url(&self, url: &str) -> Result<ExtractionResult> {
        let url = normalize_url(url)?;

        if is_paywalled(&url, &self.config.fetch.paywall_domains) {
            info!(url = %url, "paywalled domain, resolving metadata only");
            return self.metadata_only(&url).await;
        }

        let mut failure = String::new();
        let light = match self.fetcher.fetch(&url).await {
            Ok(page) if page.is_success() => {
                let result = self.extract_page(&url, &page)?;
                if result.has_body() {
                    return Ok(result);
                }
                info!(url = %url, fetcher = self.fetcher.name(), "lightweight fetch yielded too little text");
                Some(result)
            }
            Ok(page) => {
                self.check_bot_markers(&page.html, url.as_str())?;
                info!(url = %url, status = page.status, "lightweight fetch returned an error status");
                failure = format!("HTTP status {}", page.status);
                None
            }
            Err(e) => {
                info!(url = %url, error = %e, "lightweight fetch failed");
                failure = e.to_string();
                None
            }
        };

        let Some(renderer) = self.renderer.as_ref().filter(|_| self.config.fetch.render_fallback) else {
            return light.ok_or_else(|| unreachable(&url, failure));
        };

        info!(url = %url, renderer = renderer.name(), "falling back to rendered fetch");
        match renderer.fetch(&url).await {
            Ok(page) => {
                let rendered = self.extract_page(&url, &page)?;
                match light {
                    Some(light) if !rendered.has_body() => Ok(light),
                    _ => Ok(rendered),
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "rendered fetch failed");
                light.ok_or_else(|| unreachable(&url, format!("{failure}; rendering: {e}")))
            }
        }
    }

    /// Runs the extraction stages on a parsed page. Never fails.
    ///
    /// Metadata is resolved from the document as given; the body comes from
    /// its sanitized copy.
    pub fn extract_document(&self, raw: &Document, url: Option<String>) -> ExtractionResult {
        let min_length = self.config.min_length();
        let metadata = raw.resolve_metadata();

        let structured = if self.config.extract.prefer_structured_body { structured_body(raw, min_length) } else { None };
        let content = structured.unwrap_or_else(|| {
            let sanitized = raw.sanitize(&self.config.sanitize);
            self.extractor.extract(&sanitized)
        });

        let mut body = self.cleaner.clean(&content.text);
        let length = body.chars().count();
        if length < min_length {
            let reason = EchoscapeError::InsufficientContent { length, threshold: min_length };
            debug!(strategy = %content.strategy, "{}", reason);
            body.clear();
        }

        ExtractionResult::new(url, metadata, body, content.strategy)
    }

    fn extract_page(&self, url: &Url, page: &FetchedPage) -> Result<ExtractionResult> {
        self.check_bot_markers(&page.html, url.as_str())?;
        let doc = Document::parse(&page.html)?;
        Ok(self.extract_document(&doc, Some(url.to_string())))
    }

    /// Title and metadata only, from a best-effort lightweight fetch.
    async fn metadata_only(&self, url: &Url) -> Result<ExtractionResult> {
        let mut metadata = match self.fetcher.fetch(url).await {
            Ok(page) if page.is_success() => {
                self.check_bot_markers(&page.html, url.as_str())?;
                Document::parse(&page.html)?.resolve_metadata()
            }
            Ok(page) => {
                debug!(url = %url, status = page.status, "paywalled page returned an error status");
                Metadata::default()
            }
            Err(e) => {
                debug!(url = %url, error = %e, "paywalled page fetch failed");
                Metadata::default()
            }
        };

        if metadata.title == NO_TITLE
            && let Some(host) = host_of(url.as_str())
        {
            metadata.title = host;
        }

        Ok(ExtractionResult::new(Some(url.to_string()), metadata, String::new(), ExtractionStrategy::Skipped))
    }

    fn check_bot_markers(&self, html: &str, url: &str) -> Result<()> {
        match detect_bot_marker(html, &self.config.fetch.bot_markers) {
            Some(marker) => {
                warn!(url, marker, "bot-interdiction marker detected");
                Err(EchoscapeError::BotBlocked { url: url.to_string(), marker: marker.to_string() })
            }
            None => Ok(()),
        }
    }
}

fn unreachable(url: &Url, reason: String) -> EchoscapeError {
    let reason = if reason.is_empty() { "no fetch strategy available".to_string() } else { reason };
    EchoscapeError::Unreachable { url: url.to_string(), reason }
}

#[cfg(feature = "browser")]
fn default_renderer(config: &PipelineConfig) -> Option<Arc<dyn PageFetcher>> {
    use crate::render::BrowserRenderer;

    config.fetch.render_fallback.then(|| {
        Arc::new(BrowserRenderer::new(config.render.clone(), config.fetch.user_agent.clone())) as Arc<dyn PageFetcher>
    })
}

#[cfg(not(feature = "browser"))]
fn default_renderer(_config: &PipelineConfig) -> Option<Arc<dyn PageFetcher>> {
    None
}

/// Extracts an article from HTML with the default configuration.
///
/// # Example
///
/// ```rust
/// use echoscape_core::pipeline::extract_from_html;
///
/// let result = extract_from_html("<html><body><p>Short</p></body></html>", None).unwrap();
/// assert!(!result.has_body());
/// ```
pub fn extract_from_html(html: &str, source_url: Option<&str>) -> Result<ExtractionResult> {
    Pipeline::new()?.extract_from_html(html, source_url)
}

/// Fetches and extracts a URL with the default configuration.
pub async fn extract_from_url(url: &str) -> Result<ExtractionResult> {
    Pipeline::new()?.extract_from_url(url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::with_config(PipelineConfig::builder().render_fallback(false).build()).unwrap()
    }

    fn story(paragraphs: usize) -> String {
        (0..paragraphs)
            .map(|i| format!("<p>Paragraph {i} describes the council vote on the transit budget in some detail.</p>"))
            .collect()
    }

    #[test]
    fn test_extract_from_html() {
        let html = format!(
            r#"<html><head><title>Vote</title><meta property="article:author" content="Ana Ruiz"></head>
            <body><nav>Home | World</nav><article>{}</article><footer>Copyright</footer></body></html>"#,
            story(5)
        );
        let result = pipeline().extract_from_html(&html, Some("https://www.example.com/vote#top")).unwrap();

        assert_eq!(result.url.as_deref(), Some("https://www.example.com/vote"));
        assert_eq!(result.title, "Vote");
        assert_eq!(result.author.as_deref(), Some("Ana Ruiz"));
        assert_eq!(result.source.as_deref(), Some("example.com"));
        assert_eq!(result.extraction_strategy, ExtractionStrategy::KnownSelector);
        assert!(result.body_text.starts_with("Paragraph 0"));
        assert!(!result.body_text.contains("Copyright"));
        assert!(result.length() >= 250);
    }

    #[test]
    fn test_short_page_has_empty_body() {
        let html = "<html><head><title>Tiny</title></head><body><p>Just a line.</p></body></html>";
        let result = pipeline().extract_from_html(html, None).unwrap();

        assert_eq!(result.title, "Tiny");
        assert_eq!(result.body_text, "");
        assert_eq!(result.word_count, 0);
        assert_eq!(result.extraction_strategy, ExtractionStrategy::WholePage);
    }

    #[test]
    fn test_cleaning_can_empty_body() {
        let filler = "Subscribe to our newsletter for daily updates on every story. ".repeat(3);
        let html = format!("<html><body><article><p>Opening line of the story.</p><p>{filler}</p></article></body></html>");
        let config = PipelineConfig::builder().min_length(150).marker_min_offset(0).render_fallback(false).build();
        let result = Pipeline::with_config(config).unwrap().extract_from_html(&html, None).unwrap();

        assert!(!result.has_body());
    }

    #[test]
    fn test_html_bot_marker() {
        let html = r#"<html><script src="https://ct.captcha-delivery.com/c.js"></script></html>"#;
        let err = pipeline().extract_from_html(html, None).unwrap_err();
        assert!(err.is_blocked());
    }

    #[test]
    fn test_invalid_source_url() {
        let result = pipeline().extract_from_html("<p>x</p>", Some("mailto:someone@example.com"));
        assert!(matches!(result, Err(EchoscapeError::InvalidUrl(_))));
    }

    #[test]
    fn test_structured_body_opt_in() {
        let body = "Structured article text. ".repeat(20);
        let html = format!(
            r#"<html><head><script type="application/ld+json">{{"@type":"NewsArticle","articleBody":"{body}"}}</script></head>
            <body><article>{}</article></body></html>"#,
            story(5)
        );

        let default = pipeline().extract_from_html(&html, None).unwrap();
        assert_eq!(default.extraction_strategy, ExtractionStrategy::KnownSelector);

        let config = PipelineConfig::builder().prefer_structured_body(true).render_fallback(false).build();
        let structured = Pipeline::with_config(config).unwrap().extract_from_html(&html, None).unwrap();
        assert_eq!(structured.extraction_strategy, ExtractionStrategy::StructuredData);
        assert!(structured.body_text.starts_with("Structured article text."));
    }
}
