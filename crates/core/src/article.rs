//! The extraction result value object.
//!
//! [`ExtractionResult`] is what both entry points return. Its `body_text` is
//! either empty, signalling that no article was found, or at least the
//! configured minimum length.

use serde::{Deserialize, Serialize};

use crate::extract::ExtractionStrategy;
use crate::metadata::{Metadata, NO_AUTHOR, count_words};

/// The complete result of extracting one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Normalized absolute URL, when the page came from (or was tagged with) one.
    pub url: Option<String>,

    /// Title; never empty, "No Title Found" when unrecoverable.
    pub title: String,

    pub author: Option<String>,

    /// Publication date exactly as the source reported it.
    pub publish_date: Option<String>,

    /// Publication name (site name, JSON-LD publisher, or host).
    pub source: Option<String>,

    /// Cleaned prose, paragraphs separated by blank lines.
    pub body_text: String,

    /// Word count of `body_text`.
    pub word_count: usize,

    /// Which waterfall stage produced the text.
    pub extraction_strategy: ExtractionStrategy,
}

impl ExtractionResult {
    /// Assembles a result, deriving the word count from the body.
    pub fn new(
        url: Option<String>, metadata: Metadata, body_text: String, extraction_strategy: ExtractionStrategy,
    ) -> Self {
        let source = metadata.site_name.or_else(|| url.as_deref().and_then(host_of));
        let word_count = count_words(&body_text);

        Self {
            url,
            title: metadata.title,
            author: metadata.author,
            publish_date: metadata.publish_date,
            source,
            body_text,
            word_count,
            extraction_strategy,
        }
    }

    /// Whether an article body was found.
    pub fn has_body(&self) -> bool {
        !self.body_text.is_empty()
    }

    /// Body length in characters.
    pub fn length(&self) -> usize {
        self.body_text.chars().count()
    }

    /// The author, or the "No Author Found" placeholder.
    pub fn author_or_sentinel(&self) -> &str {
        self.author.as_deref().unwrap_or(NO_AUTHOR)
    }
}

/// Host name of a URL without a leading `www.`.
pub(crate) fn host_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::NO_TITLE;

    #[test]
    fn test_source_falls_back_to_host() {
        let result = ExtractionResult::new(
            Some("https://www.example.com/a".to_string()),
            Metadata::default(),
            String::new(),
            ExtractionStrategy::WholePage,
        );

        assert_eq!(result.source, Some("example.com".to_string()));
        assert_eq!(result.title, NO_TITLE);
        assert!(!result.has_body());
        assert_eq!(result.author_or_sentinel(), NO_AUTHOR);
    }

    #[test]
    fn test_site_name_preferred_over_host() {
        let metadata = Metadata { site_name: Some("Example News".to_string()), ..Default::default() };
        let result = ExtractionResult::new(
            Some("https://example.com/a".to_string()),
            metadata,
            "Two words".to_string(),
            ExtractionStrategy::Paragraphs,
        );

        assert_eq!(result.source, Some("Example News".to_string()));
        assert_eq!(result.word_count, 2);
        assert_eq!(result.length(), 9);
    }

    #[test]
    fn test_serializes_strategy_snake_case() {
        let result = ExtractionResult::new(None, Metadata::default(), String::new(), ExtractionStrategy::KnownSelector);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["extraction_strategy"], "known_selector");
        assert_eq!(json["url"], serde_json::Value::Null);
        assert_eq!(json["source"], serde_json::Value::Null);
    }
}
