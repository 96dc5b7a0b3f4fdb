//! Error taxonomy for the relay and its JSON failure envelopes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Application-wide error type
///
/// Upstream failures are tagged by the call path that produced them: the
/// asset store client yields `AssetStore`, the completion client yields
/// `Completion`, and transport failures from either surface as `HttpClient`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Access token required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    Forbidden,

    #[error("Asset store error ({http_code}): {message}")]
    AssetStore { http_code: u16, message: String },

    #[error("Completion provider returned {status}")]
    Completion { status: StatusCode, body: Value },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Shape of the failure body written to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{success:false, error, details?}` used by the upload path and routing
    Flagged,
    /// `{error, details?}` used by the completion path
    Bare,
}

#[derive(Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::HttpClient(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidMetadata(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::AssetStore { .. } => StatusCode::BAD_REQUEST,
            AppError::Completion { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short caller-facing summary
    fn summary(&self) -> String {
        match self {
            AppError::InvalidRequest(message) => message.clone(),
            AppError::InvalidMetadata(_) => "Invalid metadata JSON".to_string(),
            AppError::PayloadTooLarge(_) => "Image exceeds maximum upload size".to_string(),
            AppError::Unauthorized | AppError::Forbidden => self.to_string(),
            AppError::AssetStore { .. } => "Asset store rejected the upload".to_string(),
            AppError::Completion { .. } => "Completion provider returned an error".to_string(),
            AppError::HttpClient(_) => "Upstream service unavailable".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Detail payload; server-side causes are only exposed in development
    fn details(&self, development: bool) -> Option<Value> {
        match self {
            AppError::InvalidRequest(_) | AppError::Unauthorized | AppError::Forbidden => None,
            AppError::InvalidMetadata(message) | AppError::PayloadTooLarge(message) => {
                Some(Value::String(message.clone()))
            }
            AppError::AssetStore { message, .. } => Some(Value::String(message.clone())),
            AppError::Completion { body, .. } => Some(body.clone()),
            AppError::HttpClient(_) | AppError::Config(_) | AppError::Internal(_) => {
                development.then(|| Value::String(self.to_string()))
            }
        }
    }

    /// Render this error as a JSON response in the requested envelope style
    pub fn render(self, envelope: Envelope, development: bool) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Request rejected");
        }

        let body = ErrorBody {
            success: match envelope {
                Envelope::Flagged => Some(false),
                Envelope::Bare => None,
            },
            error: self.summary(),
            details: self.details(development),
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.render(Envelope::Flagged, false)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
