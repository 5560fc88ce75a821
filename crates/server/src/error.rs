use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use echoscape_core::EchoscapeError;
use serde_json::json;
use tracing::error;

/// Errors returned by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    Extraction(EchoscapeError),
    BadRequest(String),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Extraction(e) if e.is_blocked() => (StatusCode::FORBIDDEN, "blocked"),
            ApiError::Extraction(e) if e.is_unreachable() => (StatusCode::BAD_GATEWAY, "unreachable"),
            ApiError::Extraction(EchoscapeError::InvalidUrl(_)) => (StatusCode::BAD_REQUEST, "invalid_url"),
            ApiError::Extraction(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Extraction(e) => e.to_string(),
            ApiError::BadRequest(message) => message.clone(),
        }
    }
}

impl From<EchoscapeError> for ApiError {
    fn from(e: EchoscapeError) -> Self {
        ApiError::Extraction(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = self.message();
        if status.is_server_error() {
            error!(status = status.as_u16(), kind, %message, "request failed");
        }

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
