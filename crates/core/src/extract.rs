//! The extraction waterfall.
//!
//! An [`Extractor`] holds an ordered list of [`Strategy`] objects. Each one is
//! tried against a sanitized [`Document`]; the first that yields at least the
//! minimum length of text wins. When none does, the whole-page text is
//! returned, so extraction itself never fails.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::parse::{Document, Element};
use crate::scoring::{DensityWeights, score_block};

/// Default minimum body length in characters
pub const DEFAULT_MIN_LENGTH: usize = 250;

/// Which waterfall stage produced the body text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// JSON-LD `articleBody`
    StructuredData,
    /// A known article-wrapping selector
    KnownSelector,
    /// Highest density-scored block
    DensityScored,
    /// Longest single block
    LargestBlock,
    /// Every `<p>` joined in document order
    Paragraphs,
    /// All visible text of the page
    WholePage,
    /// Body extraction was not attempted (paywall allow-list)
    Skipped,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuredData => "structured_data",
            Self::KnownSelector => "known_selector",
            Self::DensityScored => "density_scored",
            Self::LargestBlock => "largest_block",
            Self::Paragraphs => "paragraphs",
            Self::WholePage => "whole_page",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the extraction waterfall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Minimum characters for a strategy's output to be accepted.
    /// Inclusive: text of exactly `min_length` characters passes.
    pub min_length: usize,
    /// Selectors known to wrap article bodies, tried in order
    pub known_selectors: Vec<String>,
    /// Containers considered by density scoring
    pub density_tags: Vec<String>,
    /// Containers considered by the largest-block fallback
    pub block_tags: Vec<String>,
    /// Density score weights
    pub weights: DensityWeights,
    /// Try JSON-LD `articleBody` before the HTML waterfall
    pub prefer_structured_body: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            known_selectors: [
                "article",
                "[role=main]",
                ".article-body",
                ".story-body",
                "[class*='article-body']",
                "[itemprop='articleBody']",
                ".RichTextBody",
                ".story-content",
                ".main-content",
                ".entry-content",
                ".post-content",
                "main",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            density_tags: vec!["div".to_string(), "section".to_string()],
            block_tags: ["div", "section", "article", "main"].iter().map(|s| s.to_string()).collect(),
            weights: DensityWeights::default(),
            prefer_structured_body: false,
        }
    }
}

/// Text produced by the waterfall, tagged with the stage that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub text: String,
    pub strategy: ExtractionStrategy,
}

impl ExtractedContent {
    /// Length of the text in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One stage of the waterfall.
///
/// Implementations must only return text of at least `min_length` characters.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> ExtractionStrategy;

    fn try_extract(&self, doc: &Document, min_length: usize) -> Option<String>;
}

/// Paragraph text of the first known-selector match that is long enough.
#[derive(Debug, Clone)]
pub struct KnownSelectors {
    selectors: Vec<String>,
}

impl KnownSelectors {
    pub fn new(selectors: Vec<String>) -> Self {
        Self { selectors }
    }
}

impl Strategy for KnownSelectors {
    fn kind(&self) -> ExtractionStrategy {
        ExtractionStrategy::KnownSelector
    }

    fn try_extract(&self, doc: &Document, min_length: usize) -> Option<String> {
        for selector in &self.selectors {
            let matches = match doc.select(selector) {
                Ok(matches) => matches,
                Err(e) => {
                    warn!(selector = %selector, error = %e, "skipping known selector");
                    continue;
                }
            };

            for element in matches {
                let text = paragraph_text(&element).unwrap_or_else(|| element.block_text());
                if long_enough(&text, min_length) {
                    debug!(selector = %selector, "known selector matched");
                    return Some(text);
                }
            }
        }
        None
    }
}

/// Highest-scoring prose-dense container.
#[derive(Debug, Clone)]
pub struct DensityScoring {
    selector: String,
    weights: DensityWeights,
}

impl DensityScoring {
    pub fn new(tags: &[String], weights: DensityWeights) -> Self {
        Self { selector: tags.join(", "), weights }
    }
}

impl Strategy for DensityScoring {
    fn kind(&self) -> ExtractionStrategy {
        ExtractionStrategy::DensityScored
    }

    fn try_extract(&self, doc: &Document, min_length: usize) -> Option<String> {
        let mut best: Option<(i64, String)> = None;

        for element in doc.select(&self.selector).ok()? {
            let score = score_block(&element, &self.weights);
            if score.text_length < min_length {
                continue;
            }
            // Strict comparison keeps the earliest block on ties.
            if best.as_ref().is_none_or(|(top, _)| score.score > *top) {
                best = Some((score.score, element.block_text()));
            }
        }

        best.map(|(_, text)| text)
    }
}

/// The single container with the longest text.
#[derive(Debug, Clone)]
pub struct LargestBlock {
    selector: String,
}

impl LargestBlock {
    pub fn new(tags: &[String]) -> Self {
        Self { selector: tags.join(", ") }
    }
}

impl Strategy for LargestBlock {
    fn kind(&self) -> ExtractionStrategy {
        ExtractionStrategy::LargestBlock
    }

    fn try_extract(&self, doc: &Document, min_length: usize) -> Option<String> {
        let mut best: Option<(usize, String)> = None;

        for element in doc.select(&self.selector).ok()? {
            let text = element.block_text();
            let length = text.chars().count();
            if best.as_ref().is_none_or(|(top, _)| length > *top) {
                best = Some((length, text));
            }
        }

        best.filter(|(length, _)| *length >= min_length).map(|(_, text)| text)
    }
}

/// Every paragraph in the document, joined in order.
#[derive(Debug, Clone, Default)]
pub struct ParagraphJoin;

impl Strategy for ParagraphJoin {
    fn kind(&self) -> ExtractionStrategy {
        ExtractionStrategy::Paragraphs
    }

    fn try_extract(&self, doc: &Document, min_length: usize) -> Option<String> {
        let root = doc.first("body")?;
        paragraph_text(&root).filter(|text| long_enough(text, min_length))
    }
}

/// All visible text. Always succeeds, whatever the length.
#[derive(Debug, Clone, Default)]
pub struct WholePage;

impl Strategy for WholePage {
    fn kind(&self) -> ExtractionStrategy {
        ExtractionStrategy::WholePage
    }

    fn try_extract(&self, doc: &Document, _min_length: usize) -> Option<String> {
        Some(doc.text_content())
    }
}

/// The ordered waterfall.
///
/// # Example
///
/// ```rust
/// use echoscape_core::{Document, ExtractConfig, ExtractionStrategy, Extractor};
///
/// let paragraph = "Lorem ipsum dolor sit amet. ".repeat(12);
/// let html = format!("<div class=\"article-body\"><p>{paragraph}</p></div>");
/// let doc = Document::parse(&html).unwrap();
///
/// let content = Extractor::new(&ExtractConfig::default()).extract(&doc);
/// assert_eq!(content.strategy, ExtractionStrategy::KnownSelector);
/// ```
pub struct Extractor {
    strategies: Vec<Box<dyn Strategy>>,
    fallback: WholePage,
    min_length: usize,
}

impl Extractor {
    /// Build the default waterfall: known selectors, density scoring,
    /// largest block, joined paragraphs, then the whole page.
    pub fn new(config: &ExtractConfig) -> Self {
        Self::with_strategies(
            vec![
                Box::new(KnownSelectors::new(config.known_selectors.clone())),
                Box::new(DensityScoring::new(&config.density_tags, config.weights)),
                Box::new(LargestBlock::new(&config.block_tags)),
                Box::new(ParagraphJoin),
            ],
            config.min_length,
        )
    }

    /// Build a waterfall from an explicit strategy list.
    ///
    /// The whole-page fallback always runs last and need not be included.
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>, min_length: usize) -> Self {
        Self { strategies, fallback: WholePage, min_length }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Stage order, fallback included
    pub fn order(&self) -> Vec<ExtractionStrategy> {
        self.strategies
            .iter()
            .map(|s| s.kind())
            .chain(std::iter::once(self.fallback.kind()))
            .collect()
    }

    /// Run the waterfall against a sanitized document.
    pub fn extract(&self, doc: &Document) -> ExtractedContent {
        for strategy in &self.strategies {
            if let Some(text) = strategy.try_extract(doc, self.min_length)
                && long_enough(&text, self.min_length)
            {
                debug!(strategy = %strategy.kind(), length = text.chars().count(), "extraction strategy matched");
                return ExtractedContent { text, strategy: strategy.kind() };
            }
        }

        let text = self.fallback.try_extract(doc, self.min_length).unwrap_or_default();
        debug!(length = text.chars().count(), "falling back to whole page text");
        ExtractedContent { text, strategy: ExtractionStrategy::WholePage }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&ExtractConfig::default())
    }
}

/// Run the default waterfall built from `config` against a sanitized document.
pub fn extract_content(doc: &Document, config: &ExtractConfig) -> ExtractedContent {
    Extractor::new(config).extract(doc)
}

/// Use a JSON-LD `articleBody` when it is long enough.
///
/// Reads the unsanitized document, since sanitizing drops `<script>` blocks.
pub fn structured_body(raw: &Document, min_length: usize) -> Option<ExtractedContent> {
    let text = crate::metadata::json_ld_article_body(raw)?;
    let text = crate::clean::normalize_whitespace(&text);
    long_enough(&text, min_length).then_some(ExtractedContent { text, strategy: ExtractionStrategy::StructuredData })
}

/// Non-empty `<p>` texts under `element`, joined by blank lines.
fn paragraph_text(element: &Element<'_>) -> Option<String> {
    let paragraphs: Vec<String> = element
        .select("p")
        .ok()?
        .iter()
        .map(|p| p.inline_text())
        .filter(|t| !t.is_empty())
        .collect();

    if paragraphs.is_empty() { None } else { Some(paragraphs.join("\n\n")) }
}

/// Counts Unicode scalar values; the bound is inclusive.
fn long_enough(text: &str, min_length: usize) -> bool {
    text.chars().count() >= min_length
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prose(words: usize) -> String {
        "the quick brown fox jumps over the lazy dog "
            .split_whitespace()
            .cycle()
            .take(words)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_known_selector_joins_paragraphs() {
        let a = format!("A {}", prose(30));
        let b = format!("B {}", prose(30));
        let html = format!(r#"<html><body><div class="article-body"><p>{a}</p><p>{b}</p></div></body></html>"#);
        let doc = Document::parse(&html).unwrap();

        let content = Extractor::default().extract(&doc);
        assert_eq!(content.strategy, ExtractionStrategy::KnownSelector);
        assert_eq!(content.text, format!("{a}\n\n{b}"));
    }

    #[test]
    fn test_known_selector_skips_short_match() {
        let long = prose(60);
        let html = format!(
            r#"<html><body><article><p>Teaser</p></article><div class="story-body"><p>{long}</p></div></body></html>"#
        );
        let doc = Document::parse(&html).unwrap();

        let text = KnownSelectors::new(ExtractConfig::default().known_selectors).try_extract(&doc, 250);
        assert_eq!(text, Some(long));
    }

    #[test]
    fn test_min_length_is_inclusive() {
        let body: String = "é".repeat(250);
        let html = format!("<html><body><article><p>{body}</p></article></body></html>");
        let doc = Document::parse(&html).unwrap();
        let strategy = KnownSelectors::new(ExtractConfig::default().known_selectors);

        assert_eq!(strategy.try_extract(&doc, 250), Some(body));
        assert_eq!(strategy.try_extract(&doc, 251), None);
        assert_eq!(Extractor::default().extract(&doc).strategy, ExtractionStrategy::KnownSelector);
    }

    #[test]
    fn test_invalid_known_selector_is_skipped() {
        let html = format!("<main><p>{}</p></main>", prose(60));
        let doc = Document::parse(&html).unwrap();
        let strategy = KnownSelectors::new(vec!["[[bad".to_string(), "main".to_string()]);
        assert!(strategy.try_extract(&doc, 250).is_some());
    }

    #[test]
    fn test_density_prefers_prose_over_links() {
        let links: String = (0..40).map(|i| format!(r##"<a href="#">Headline number {i}</a> "##)).collect();
        let html = format!(
            r#"<html><body>
                <div id="links">{links}</div>
                <section id="story"><p>{}</p><p>{}</p><p>{}</p></section>
            </body></html>"#,
            prose(30),
            prose(30),
            prose(30)
        );
        let doc = Document::parse(&html).unwrap();

        let text = DensityScoring::new(&["div".to_string(), "section".to_string()], DensityWeights::default())
            .try_extract(&doc, 250)
            .unwrap();
        assert!(text.starts_with("the quick"));
        assert!(!text.contains("Headline"));
    }

    #[test]
    fn test_density_tie_keeps_first_block() {
        let body = prose(60);
        let html = format!(r#"<div id="one">{body}</div><div id="two">{body}</div>"#);
        let doc = Document::parse(&html).unwrap();
        let strategy = DensityScoring::new(&["div".to_string()], DensityWeights::default());
        assert_eq!(strategy.try_extract(&doc, 250), Some(body));
    }

    #[test]
    fn test_largest_block_threshold() {
        let html = format!("<div>{}</div><div>{}</div>", prose(5), prose(20));
        let doc = Document::parse(&html).unwrap();
        let strategy = LargestBlock::new(&["div".to_string()]);

        assert_eq!(strategy.try_extract(&doc, 50), Some(prose(20)));
        assert_eq!(strategy.try_extract(&doc, 1000), None);
    }

    #[test]
    fn test_paragraph_join() {
        let html = "<body><span><p>One</p></span><div><p>  </p><p>Two</p></div></body>";
        let doc = Document::parse(html).unwrap();
        assert_eq!(ParagraphJoin.try_extract(&doc, 5), Some("One\n\nTwo".to_string()));
        assert_eq!(ParagraphJoin.try_extract(&doc, 250), None);
    }

    #[test]
    fn test_whole_page_fallback_may_be_short() {
        let doc = Document::parse("<html><body><span>Tiny page</span></body></html>").unwrap();
        let content = Extractor::default().extract(&doc);

        assert_eq!(content.strategy, ExtractionStrategy::WholePage);
        assert_eq!(content.text, "Tiny page");
    }

    #[test]
    fn test_waterfall_order() {
        let order = Extractor::default().order();
        assert_eq!(
            order,
            vec![
                ExtractionStrategy::KnownSelector,
                ExtractionStrategy::DensityScored,
                ExtractionStrategy::LargestBlock,
                ExtractionStrategy::Paragraphs,
                ExtractionStrategy::WholePage,
            ]
        );
    }

    #[test]
    fn test_strategy_serialization() {
        let json = serde_json::to_string(&ExtractionStrategy::KnownSelector).unwrap();
        assert_eq!(json, "\"known_selector\"");
        assert_eq!(ExtractionStrategy::DensityScored.to_string(), "density_scored");
    }

    struct Fixed(ExtractionStrategy, &'static str);

    impl Strategy for Fixed {
        fn kind(&self) -> ExtractionStrategy {
            self.0
        }

        fn try_extract(&self, _doc: &Document, _min_length: usize) -> Option<String> {
            Some(self.1.to_string())
        }
    }

    #[test]
    fn test_custom_strategy_list_enforces_threshold() {
        let extractor = Extractor::with_strategies(
            vec![
                Box::new(Fixed(ExtractionStrategy::KnownSelector, "short")),
                Box::new(Fixed(ExtractionStrategy::Paragraphs, "long enough text")),
            ],
            10,
        );
        let doc = Document::parse("<p>x</p>").unwrap();
        let content = extractor.extract(&doc);
        assert_eq!(content.strategy, ExtractionStrategy::Paragraphs);
        assert_eq!(content.text, "long enough text");
    }
}
