//! HTTP router assembly

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use std::{convert::Infallible, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{completion, health, upload};
use crate::config::ServerConfig;
use crate::middleware::{auth::BearerAuthLayer, panic::handle_panic};
use crate::AppState;

/// Build the relay router
///
/// Only `/upload` sits behind the bearer guard and the raised body limit.
pub fn create_router(state: Arc<AppState>) -> Router {
    let settings = &state.settings;

    if settings.upload_token().is_none() {
        tracing::warn!("No upload token configured; every /upload request will be rejected");
    }

    let upload_route = post(upload::upload_image)
        .layer::<_, Infallible>(DefaultBodyLimit::max(settings.upload_body_limit()))
        .layer(BearerAuthLayer::new(settings.upload_token()));

    Router::new()
        .route("/health", get(health::health))
        .route("/upload", upload_route)
        .route("/api/claude", post(completion::create_completion))
        .fallback(health::not_found)
        .layer(cors_layer(&settings.server))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins = if server.cors_allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            server
                .cors_allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
