//! Liveness and fallback responses

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const AVAILABLE_ENDPOINTS: &[&str] = &["GET /health", "POST /upload", "POST /api/claude"];

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
}

/// Reports the process as up; never contacts a provider
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Asset relay is running",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotFoundResponse {
    success: bool,
    error: &'static str,
    path: String,
    available_endpoints: &'static [&'static str],
}

pub async fn not_found(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No route matched");
    let body = NotFoundResponse {
        success: false,
        error: "Endpoint not found",
        path: uri.path().to_string(),
        available_endpoints: AVAILABLE_ENDPOINTS,
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
