//! Pipeline configuration.
//!
//! Every heuristic constant the pipeline depends on lives here so it can be
//! overridden in code through [`PipelineConfig::builder`] or from a TOML file.
//! All sections and fields are optional in the file:
//!
//! ```toml
//! [extract]
//! min_length = 300
//!
//! [clean]
//! markers = ["Related Articles", "More on this story"]
//!
//! [fetch]
//! paywall_domains = ["nytimes.com", "wsj.com"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{AnalysisConfig, AnalyzerBackend};
use crate::clean::CleanConfig;
use crate::extract::ExtractConfig;
use crate::fetch::FetchConfig;
use crate::render::RenderConfig;
use crate::sanitize::SanitizeConfig;
use crate::{EchoscapeError, Result};

/// Configuration for the whole pipeline.
///
/// `extract.min_length` is the single minimum body length: it gates each
/// waterfall stage, decides whether a lightweight fetch was sufficient, and
/// bounds the final `body_text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub render: RenderConfig,
    pub sanitize: SanitizeConfig,
    pub extract: ExtractConfig,
    pub clean: CleanConfig,
    pub analysis: AnalysisConfig,
}

impl PipelineConfig {
    /// Creates a new builder for PipelineConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use echoscape_core::PipelineConfig;
    ///
    /// let config = PipelineConfig::builder()
    ///     .min_length(400)
    ///     .render_fallback(false)
    ///     .build();
    /// assert_eq!(config.min_length(), 400);
    /// ```
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    pub fn min_length(&self) -> usize {
        self.extract.min_length
    }

    /// Reads a TOML configuration file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EchoscapeError::ConfigError`] if the file is not valid TOML
    /// or has fields of the wrong type.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| EchoscapeError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EchoscapeError::ConfigError(e.to_string()))
    }

    /// Loads `path` if given, else the file at [`PipelineConfig::default_path`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// The default config file path: `<config_dir>/echoscape/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("echoscape").join("config.toml"))
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EchoscapeError::ConfigError(e.to_string()))
    }
}

/// Builder for PipelineConfig.
///
/// # Example
///
/// ```rust
/// use echoscape_core::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .boilerplate_markers(vec!["More on this story".to_string()])
///     .paywall_domains(vec!["example-paywall.com".to_string()])
///     .timeout(5)
///     .build();
/// assert_eq!(config.fetch.timeout, 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Sets the minimum body length in characters.
    pub fn min_length(mut self, value: usize) -> Self {
        self.config.extract.min_length = value;
        self
    }

    /// Replaces the boilerplate truncation markers.
    pub fn boilerplate_markers(mut self, markers: Vec<String>) -> Self {
        self.config.clean.markers = markers;
        self
    }

    /// Sets the offset before which markers are ignored.
    pub fn marker_min_offset(mut self, value: usize) -> Self {
        self.config.clean.marker_min_offset = value;
        self
    }

    /// Replaces the known article selectors.
    pub fn known_selectors(mut self, selectors: Vec<String>) -> Self {
        self.config.extract.known_selectors = selectors;
        self
    }

    /// Tries JSON-LD `articleBody` before the HTML waterfall.
    pub fn prefer_structured_body(mut self, value: bool) -> Self {
        self.config.extract.prefer_structured_body = value;
        self
    }

    /// Replaces the hard-paywall allow-list.
    pub fn paywall_domains(mut self, domains: Vec<String>) -> Self {
        self.config.fetch.paywall_domains = domains;
        self
    }

    /// Replaces the bot-interdiction markers.
    pub fn bot_markers(mut self, markers: Vec<String>) -> Self {
        self.config.fetch.bot_markers = markers;
        self
    }

    /// Sets the HTTP timeout in seconds.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.fetch.timeout = seconds;
        self
    }

    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    /// Enables or disables the browser rendering fallback.
    pub fn render_fallback(mut self, value: bool) -> Self {
        self.config.fetch.render_fallback = value;
        self
    }

    /// Sets how long rendering waits for a content selector, in seconds.
    pub fn render_wait(mut self, seconds: u64) -> Self {
        self.config.render.wait_timeout = seconds;
        self
    }

    pub fn analyzer_backend(mut self, backend: AnalyzerBackend) -> Self {
        self.config.analysis.backend = backend;
        self
    }

    /// Sets the analyzer time budget in seconds.
    pub fn analyzer_timeout(mut self, seconds: u64) -> Self {
        self.config.analysis.timeout = seconds;
        self
    }

    pub fn keyword_cap(mut self, value: usize) -> Self {
        self.config.analysis.keyword_cap = value;
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
