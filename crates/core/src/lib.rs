pub mod analysis;
pub mod article;
pub mod clean;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod metadata;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod sanitize;
pub mod scoring;

pub use analysis::{
    AnalysisConfig, AnalysisResult, Analyzer, AnalyzerBackend, Category, LexiconAnalyzer, LlmAnalyzer, LlmConfig,
    SharedAnalyzer, build_analyzer,
};
pub use article::ExtractionResult;
pub use clean::{CleanConfig, Cleaner, clean_text, normalize_whitespace};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{EchoscapeError, Result};
pub use extract::{
    DEFAULT_MIN_LENGTH, ExtractConfig, ExtractedContent, ExtractionStrategy, Extractor, Strategy, extract_content,
};
pub use fetch::{FetchConfig, FetchedPage, HttpFetcher, PageFetcher};
pub use fetch::{fetch_file, fetch_stdin, fetch_url};
pub use metadata::{Metadata, NO_AUTHOR, NO_TITLE, resolve_metadata};
pub use parse::Document;
pub use pipeline::{Pipeline, extract_from_html, extract_from_url};
#[cfg(feature = "browser")]
pub use render::BrowserRenderer;
pub use render::RenderConfig;
pub use sanitize::{SanitizeConfig, sanitize_document, sanitize_html};
#[doc(hidden)]
pub use scoring::{BlockScore, DensityWeights, link_density, score_block};
