//! `POST /upload` handler

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::error::{AppError, Envelope, Result};
use crate::relay::metadata::{Metadata, DEFAULT_OBJECT_ID};
use crate::relay::upload::{relay_upload, UploadRequest, UploadResult};
use crate::AppState;

/// Upload an image and its metadata to the asset store
///
/// Expects `multipart/form-data` with an `image` file part, an optional
/// `metadata` JSON text part and an optional `filename` text part.
#[tracing::instrument(skip_all, fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let development = state.settings.server.is_development();

    match handle_upload(&state, multipart).await {
        Ok(uploaded) => Json(uploaded).into_response(),
        Err(err) => err.render(Envelope::Flagged, development),
    }
}

async fn handle_upload(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<UploadResult> {
    // A body that is not a form cannot carry the image part
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "Upload body is not multipart");
        no_image()
    })?;
    let request = read_upload(multipart).await?;
    relay_upload(state.asset_store.as_ref(), request, &state.settings.upload).await
}

fn no_image() -> AppError {
    AppError::InvalidRequest("No image file provided".to_string())
}

/// Collect the form parts into an `UploadRequest`
async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest> {
    let mut image: Option<Vec<u8>> = None;
    let mut part_filename: Option<String> = None;
    let mut filename: Option<String> = None;
    let mut metadata: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                part_filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                image = Some(data.to_vec());
            }
            "metadata" => metadata = Some(field.text().await.map_err(multipart_error)?),
            "filename" => filename = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let image = image.ok_or_else(no_image)?;
    let metadata = Metadata::parse(metadata.as_deref())?;
    let filename = filename
        .filter(|f| !f.trim().is_empty())
        .or(part_filename)
        .unwrap_or_else(|| DEFAULT_OBJECT_ID.to_string());

    Ok(UploadRequest {
        image,
        metadata,
        filename,
    })
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidRequest(format!("Failed to read multipart body: {}", err.body_text()))
    }
}
