//! `POST /api/claude` handler

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::error::{AppError, Envelope};
use crate::relay::completion::{relay_completion, CompletionRequest};
use crate::AppState;

/// Forward a prompt to the completion provider with the caller's own key
///
/// This route is not behind the bearer guard: whoever can reach it spends
/// the provider credit of the key they send.
#[tracing::instrument(skip_all, fields(operation = "completion"))]
pub async fn create_completion(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CompletionRequest>, JsonRejection>,
) -> Response {
    let development = state.settings.server.is_development();

    let result = match payload {
        Ok(Json(request)) => relay_completion(state.completions.as_ref(), &request).await,
        Err(rejection) => Err(AppError::InvalidRequest(format!(
            "Invalid JSON body: {}",
            rejection.body_text()
        ))),
    };

    match result {
        Ok(completion) => Json(completion).into_response(),
        Err(err) => err.render(Envelope::Bare, development),
    }
}
