use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;
use echoscape_core::{Pipeline, PipelineConfig, SharedAnalyzer};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use routes::AppState;

mod error;
mod routes;

const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Slack on top of the fetch, render and analysis budgets.
const REQUEST_SLACK_SECS: u64 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("echoscape_server=info,echoscape_core=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = env::var_os("ECHOSCAPE_CONFIG").map(PathBuf::from);
    let config = PipelineConfig::load_or_default(config_path.as_deref()).context("Failed to load configuration")?;

    let request_timeout = Duration::from_secs(
        config.fetch.timeout + config.render.timeout + config.analysis.timeout + REQUEST_SLACK_SECS,
    );
    let analyzer = SharedAnalyzer::new(config.analysis.clone());
    let pipeline = Pipeline::with_config(config).context("Failed to build extraction pipeline")?;

    let state = AppState { pipeline: Arc::new(pipeline), analyzer: Arc::new(analyzer) };
    let app = routes::router(state)
        .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = env::var("ECHOSCAPE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, timeout_secs = request_timeout.as_secs(), "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
