use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use echoscape_core::{AnalysisResult, ExtractionResult, Pipeline, SharedAnalyzer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::error::ApiError;

/// Shared by every request: the pipeline is immutable and the analyzer
/// backend is built once on first use.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub analyzer: Arc<SharedAnalyzer>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub url: Option<String>,
    /// Already captured HTML; `url` then only tags the result.
    pub html: Option<String>,
    /// Defaults to true.
    pub analyze: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub extraction: ExtractionResult,
    pub analysis: Option<AnalysisResult>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn extract(
    State(state): State<AppState>, Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let extraction = match (request.html, request.url) {
        (Some(html), url) => state.pipeline.extract_from_html(&html, url.as_deref())?,
        (None, Some(url)) => state.pipeline.extract_from_url(&url).await?,
        (None, None) => return Err(ApiError::BadRequest("either `url` or `html` is required".to_string())),
    };

    let analysis = if request.analyze.unwrap_or(true) {
        Some(state.analyzer.analyze_or_neutral(&extraction.body_text).await)
    } else {
        None
    };

    info!(
        url = extraction.url.as_deref().unwrap_or("<html>"),
        strategy = %extraction.extraction_strategy,
        words = extraction.word_count,
        "article extracted"
    );

    Ok(Json(ExtractResponse { extraction, analysis }))
}
