//! Functional tests for the upload bearer guard

#[path = "../common/mod.rs"]
mod common;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use asset_relay::middleware::auth::BearerAuthLayer;
use common::{
    create_test_app, status_and_json, test_settings, upload_request, FormPart,
    RecordingCompletions, RecordingStore,
};

fn guarded_app(secret: Option<&str>) -> Router {
    Router::new()
        .route("/test", axum::routing::get(|| async { "OK" }))
        .layer(BearerAuthLayer::new(secret))
}

#[tokio::test]
async fn test_auth_with_valid_bearer_token() {
    let response = guarded_app(Some("valid-key"))
        .oneshot(
            Request::builder()
                .uri("/test")
                .header(AUTHORIZATION, "Bearer valid-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_without_header_is_unauthorized() {
    let response = guarded_app(Some("valid-key"))
        .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let (status, body) = status_and_json(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Access token required");
}

#[tokio::test]
async fn test_auth_scheme_without_token_is_unauthorized() {
    let response = guarded_app(Some("valid-key"))
        .oneshot(
            Request::builder()
                .uri("/test")
                .header(AUTHORIZATION, "valid-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_with_wrong_token_is_forbidden() {
    let response = guarded_app(Some("valid-key"))
        .oneshot(
            Request::builder()
                .uri("/test")
                .header(AUTHORIZATION, "Bearer invalid-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let (status, body) = status_and_json(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_auth_without_configured_secret_rejects_everything() {
    let response = guarded_app(None)
        .oneshot(
            Request::builder()
                .uri("/test")
                .header(AUTHORIZATION, "Bearer anything")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_upload_with_invalid_token_never_reaches_store() {
    let store = Arc::new(RecordingStore::default());
    let app = create_test_app(
        test_settings(),
        store.clone(),
        Arc::new(RecordingCompletions::replying("unused")),
    );

    let response = app
        .oneshot(upload_request(
            Some("not-the-secret"),
            &[FormPart::File("image", "hero.png", b"fake-png")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_upload_without_token_never_reaches_store() {
    let store = Arc::new(RecordingStore::default());
    let app = create_test_app(
        test_settings(),
        store.clone(),
        Arc::new(RecordingCompletions::replying("unused")),
    );

    let response = app
        .oneshot(upload_request(
            None,
            &[FormPart::File("image", "hero.png", b"fake-png")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_completion_route_is_not_guarded() {
    let completions = Arc::new(RecordingCompletions::replying("Bonjour"));
    let app = create_test_app(
        test_settings(),
        Arc::new(RecordingStore::default()),
        completions.clone(),
    );

    let response = app
        .oneshot(common::json_request(
            "/api/claude",
            serde_json::json!({
                "prompt": "Say hello",
                "fieldType": "title",
                "targetLocale": "fr-FR",
                "apiKey": "sk-caller"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(completions.calls(), 1);
}
