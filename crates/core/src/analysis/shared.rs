//! Process-wide analyzer handle.
//!
//! Backends can be expensive to construct (a lexicon table, an HTTP client,
//! a model). [`SharedAnalyzer`] builds its backend on first use, exactly once
//! even under concurrent callers, and is passed around as an ordinary value
//! so tests can inject a stub.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{AnalysisConfig, AnalysisResult, Analyzer, build_analyzer};
use crate::{EchoscapeError, Result};

type Factory = Box<dyn Fn() -> Result<Arc<dyn Analyzer>> + Send + Sync>;

/// Lazily initialized analyzer with a per-call time budget.
pub struct SharedAnalyzer {
    cell: OnceCell<Arc<dyn Analyzer>>,
    factory: Factory,
    timeout: Duration,
}

impl SharedAnalyzer {
    /// Defers construction of the configured backend until first use.
    pub fn new(config: AnalysisConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout);
        Self::with_factory(move || build_analyzer(&config), timeout)
    }

    pub fn with_factory<F>(factory: F, timeout: Duration) -> Self
    where
        F: Fn() -> Result<Arc<dyn Analyzer>> + Send + Sync + 'static,
    {
        Self { cell: OnceCell::new(), factory: Box::new(factory), timeout }
    }

    /// Wraps an already constructed analyzer.
    pub fn with_analyzer(analyzer: Arc<dyn Analyzer>, timeout: Duration) -> Self {
        let fallback = analyzer.clone();
        Self { cell: OnceCell::new_with(Some(analyzer)), factory: Box::new(move || Ok(fallback.clone())), timeout }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// The backend, constructing it on first call.
    ///
    /// A failed construction is not cached; the next call retries.
    pub async fn get(&self) -> Result<Arc<dyn Analyzer>> {
        self.cell
            .get_or_try_init(|| async {
                let analyzer = (self.factory)()?;
                debug!(analyzer = analyzer.name(), "analyzer initialized");
                Ok::<_, EchoscapeError>(analyzer)
            })
            .await
            .cloned()
    }

    /// Analyze `text` within the time budget.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let analyzer = self.get().await?;

        match tokio::time::timeout(self.timeout, analyzer.analyze(text)).await {
            Ok(result) => result,
            Err(_) => Err(EchoscapeError::AnalyzerTimeout { timeout: self.timeout.as_secs() }),
        }
    }

    /// Analyze `text`, degrading any failure to [`AnalysisResult::neutral`].
    ///
    /// Empty text is neutral without consulting the backend.
    pub async fn analyze_or_neutral(&self, text: &str) -> AnalysisResult {
        if text.trim().is_empty() {
            return AnalysisResult::neutral();
        }

        match self.analyze(text).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "analysis failed, using neutral defaults");
                AnalysisResult::neutral()
            }
        }
    }

    /// Drops the backend; the next call constructs a fresh one.
    pub fn shutdown(&mut self) {
        if self.cell.take().is_some() {
            debug!("analyzer released");
        }
    }
}

impl Default for SharedAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
