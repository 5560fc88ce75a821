//! Error types for Echoscape operations.
//!
//! This module defines the main error type [`EchoscapeError`]. Only retrieval
//! failures are hard errors: the sanitizer, extractor, cleaner and metadata
//! resolver degrade to weaker results instead of failing.
//!
//! # Example
//!
//! ```rust
//! use echoscape_core::{EchoscapeError, Result};
//!
//! fn check(html: &str) -> Result<()> {
//!     if html.contains("captcha-delivery.com") {
//!         return Err(EchoscapeError::BotBlocked {
//!             url: "https://example.com".to_string(),
//!             marker: "captcha-delivery.com".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for retrieval, extraction and analysis.
///
/// Callers translating errors into user-facing messages should use
/// [`EchoscapeError::is_blocked`] to tell "the site blocked us" apart from
/// technical failures.
#[derive(Error, Debug)]
pub enum EchoscapeError {
    /// HTTP request errors from reqwest.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request or render timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a URL cannot be parsed, or uses a scheme other than http(s).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid CSS selector or unparsable markup.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// No fetch strategy produced a response.
    ///
    /// Both the lightweight request and the rendering fallback failed at the
    /// network level (or the fallback is disabled).
    #[error("Could not retrieve {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// A bot-interdiction signature was found in the served page.
    ///
    /// Extraction is abandoned instead of returning challenge-page text.
    #[error("Access to {url} was blocked by an anti-bot challenge ({marker})")]
    BotBlocked { url: String, marker: String },

    /// Every extraction strategy produced less text than the minimum length.
    ///
    /// Never returned by the public entry points: it surfaces as a successful
    /// result with an empty `body_text`.
    #[error("Extracted {length} characters, below the minimum of {threshold}")]
    InsufficientContent { length: usize, threshold: usize },

    /// Headless browser launch, navigation or capture failure.
    #[error("Browser rendering failed: {0}")]
    Browser(String),

    /// Analyzer backend failure.
    #[error("Analysis failed: {0}")]
    Analyzer(String),

    /// Analyzer call exceeded its time budget.
    #[error("Analysis timed out after {timeout} seconds")]
    AnalyzerTimeout { timeout: u64 },

    /// Configuration file errors.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File and stream I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EchoscapeError {
    /// Whether the site deliberately refused automated access.
    pub fn is_blocked(&self) -> bool {
        matches!(self, EchoscapeError::BotBlocked { .. })
    }

    /// Whether the failure was a network-level retrieval problem.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            EchoscapeError::Unreachable { .. } | EchoscapeError::Timeout { .. } | EchoscapeError::HttpError(_)
        )
    }
}

/// Result type alias for EchoscapeError.
pub type Result<T> = std::result::Result<T, EchoscapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EchoscapeError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_bot_blocked_error() {
        let err = EchoscapeError::BotBlocked {
            url: "https://example.com/a".to_string(),
            marker: "captcha-delivery.com".to_string(),
        };
        assert!(err.is_blocked());
        assert!(!err.is_unreachable());
        assert!(err.to_string().contains("captcha-delivery.com"));
    }

    #[test]
    fn test_unreachable_error() {
        let err = EchoscapeError::Unreachable { url: "https://example.com".to_string(), reason: "dns".to_string() };
        assert!(err.is_unreachable());
        assert!(!err.is_blocked());
        assert!(err.to_string().contains("dns"));
    }

    #[test]
    fn test_insufficient_content_error() {
        let err = EchoscapeError::InsufficientContent { length: 120, threshold: 250 };
        assert!(err.to_string().contains("120"));
        assert!(err.to_string().contains("250"));
    }

    #[test]
    fn test_timeout_error() {
        let err = EchoscapeError::Timeout { timeout: 12 };
        assert!(err.is_unreachable());
        assert!(err.to_string().contains("12"));
    }
}
