//! Sentiment, keyword and category analysis of extracted text.
//!
//! The pipeline treats analysis as a pluggable capability behind the
//! [`Analyzer`] trait. Two backends ship with the crate:
//!
//! - [`LexiconAnalyzer`]: offline valence lexicon with frequency keywords
//! - [`LlmAnalyzer`]: an OpenAI-compatible chat-completions endpoint
//!
//! [`SharedAnalyzer`] wraps either one as a lazily initialized, process-wide
//! resource and degrades failures to [`AnalysisResult::neutral`].

pub mod lexicon;
pub mod llm;
pub mod shared;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use lexicon::LexiconAnalyzer;
pub use llm::{LlmAnalyzer, LlmConfig};
pub use shared::SharedAnalyzer;

/// Topical category of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Politics,
    Technology,
    Sports,
    Business,
    Entertainment,
    Science,
    Health,
    #[serde(rename = "World News")]
    WorldNews,
    Lifestyle,
    Crime,
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Politics,
        Category::Technology,
        Category::Sports,
        Category::Business,
        Category::Entertainment,
        Category::Science,
        Category::Health,
        Category::WorldNews,
        Category::Lifestyle,
        Category::Crime,
        Category::Other,
    ];

    /// Display label, as stored by callers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Politics => "Politics",
            Self::Technology => "Technology",
            Self::Sports => "Sports",
            Self::Business => "Business",
            Self::Entertainment => "Entertainment",
            Self::Science => "Science",
            Self::Health => "Health",
            Self::WorldNews => "World News",
            Self::Lifestyle => "Lifestyle",
            Self::Crime => "Crime",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive label lookup; unknown labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
            .unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of an analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Sentiment in `[-1.0, 1.0]`
    pub sentiment_score: f64,
    /// Most relevant first, no duplicates
    pub keywords: Vec<String>,
    pub category: Category,
}

impl AnalysisResult {
    /// Builds a result, clamping the score and deduplicating and capping keywords.
    pub fn new(sentiment_score: f64, keywords: Vec<String>, category: Category, keyword_cap: usize) -> Self {
        let sentiment_score = if sentiment_score.is_finite() { sentiment_score.clamp(-1.0, 1.0) } else { 0.0 };

        let mut unique: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.trim();
            if keyword.is_empty() || unique.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
                continue;
            }
            unique.push(keyword.to_string());
        }
        unique.truncate(keyword_cap);

        Self { sentiment_score, keywords: unique, category }
    }

    /// Result used when analysis fails or times out.
    pub fn neutral() -> Self {
        Self { sentiment_score: 0.0, keywords: Vec::new(), category: Category::Other }
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::neutral()
    }
}

/// A sentiment, keyword and category backend.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Which analyzer backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerBackend {
    #[default]
    Lexicon,
    Llm,
}

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub backend: AnalyzerBackend,
    /// Per-call time budget in seconds
    pub timeout: u64,
    /// Maximum number of keywords returned
    pub keyword_cap: usize,
    pub llm: LlmConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { backend: AnalyzerBackend::Lexicon, timeout: 20, keyword_cap: 10, llm: LlmConfig::default() }
    }
}

/// Construct the configured backend.
pub fn build_analyzer(config: &AnalysisConfig) -> Result<Arc<dyn Analyzer>> {
    Ok(match config.backend {
        AnalyzerBackend::Lexicon => Arc::new(LexiconAnalyzer::new(config.keyword_cap)),
        AnalyzerBackend::Llm => Arc::new(LlmAnalyzer::new(config.llm.clone(), config.keyword_cap)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::from_label("world news"), Category::WorldNews);
        assert_eq!(Category::from_label(" Technology "), Category::Technology);
        assert_eq!(Category::from_label("Astrology"), Category::Other);
        assert_eq!(Category::WorldNews.to_string(), "World News");
    }

    #[test]
    fn test_category_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Category::WorldNews).unwrap(), "\"World News\"");
        let parsed: Category = serde_json::from_str("\"Crime\"").unwrap();
        assert_eq!(parsed, Category::Crime);
    }

    #[test]
    fn test_result_normalization() {
        let keywords = vec!["Budget", "budget", " ", "senate", "vote"].into_iter().map(String::from).collect();
        let result = AnalysisResult::new(3.5, keywords, Category::Politics, 2);

        assert_eq!(result.sentiment_score, 1.0);
        assert_eq!(result.keywords, vec!["Budget", "senate"]);
        assert_eq!(AnalysisResult::new(f64::NAN, Vec::new(), Category::Other, 10).sentiment_score, 0.0);
    }

    #[test]
    fn test_neutral() {
        let neutral = AnalysisResult::neutral();
        assert_eq!(neutral.sentiment_score, 0.0);
        assert!(neutral.keywords.is_empty());
        assert_eq!(neutral.category, Category::Other);
    }

    #[test]
    fn test_backend_from_toml() {
        let config: AnalysisConfig = toml::from_str("backend = \"llm\"\ntimeout = 5").unwrap();
        assert_eq!(config.backend, AnalyzerBackend::Llm);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.keyword_cap, 10);
    }
}
