//! Signed upload client for a Cloudinary-compatible asset store

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::traits::{AssetStore, AssetUpload, StoredAsset};
use crate::config::AssetStoreConfig;
use crate::error::{AppError, Result};

/// Asset store reached over its signed upload endpoint
pub struct CloudinaryStore {
    client: Client,
    cloud_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct ApiUploadResponse {
    public_id: String,
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    format: String,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Signature over the upload parameters
///
/// Parameters are sorted by name, joined as `k=v&k=v`, suffixed with the
/// API secret and hashed with SHA-256.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let payload = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    hex::encode(Sha256::digest(format!("{}{}", payload, api_secret).as_bytes()))
}

impl CloudinaryStore {
    pub fn new(config: &AssetStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            cloud_url: format!(
                "{}/{}",
                config.api_base.trim_end_matches('/'),
                config.cloud_name
            ),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// Endpoint for the upload's resource kind, e.g. `{cloud}/image/upload`
    fn upload_url(&self, upload: &AssetUpload) -> String {
        let resource_type = match upload.resource_type.trim() {
            "" => "image",
            kind => kind,
        };
        format!("{}/{}/upload", self.cloud_url, resource_type)
    }

    /// Parameters covered by the signature; `file`, `api_key` and
    /// `resource_type` are sent but never signed
    fn signed_params(&self, upload: &AssetUpload, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("public_id", upload.public_id.clone()),
            ("overwrite", upload.overwrite.to_string()),
            ("use_filename", "true".to_string()),
            ("unique_filename", "false".to_string()),
            ("signature_algorithm", "sha256".to_string()),
            ("timestamp", timestamp.to_string()),
        ];

        if !upload.folder.is_empty() {
            params.push(("folder", upload.folder.clone()));
        }

        let context = upload.provider_context();
        if !context.is_empty() {
            params.push(("context", context));
        }

        if !upload.tags.is_empty() {
            params.push(("tags", upload.tags.join(",")));
        }

        params
    }

    fn build_form(&self, upload: &AssetUpload, image: Vec<u8>, timestamp: i64) -> Form {
        let params = self.signed_params(upload, timestamp);
        let signature = sign_params(&params, &self.api_secret);

        let form = params
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .text("api_key", self.api_key.clone())
            .text("signature", signature);

        form.part("file", Part::bytes(image).file_name(upload.public_id.clone()))
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn upload(&self, upload: AssetUpload, image: Vec<u8>) -> Result<StoredAsset> {
        let timestamp = chrono::Utc::now().timestamp();
        debug!(
            public_id = %upload.public_id,
            folder = %upload.folder,
            size = image.len(),
            "Sending signed upload"
        );

        let url = self.upload_url(&upload);
        let form = self.build_form(&upload, image, timestamp);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!(status = %status, message = %message, "Asset store rejected upload");
            return Err(AppError::AssetStore {
                http_code: status.as_u16(),
                message,
            });
        }

        let api_response: ApiUploadResponse = response.json().await.map_err(|e| {
            AppError::Internal(format!("Failed to parse asset store response: {}", e))
        })?;

        Ok(StoredAsset {
            url: api_response
                .secure_url
                .or(api_response.url)
                .unwrap_or_default(),
            public_id: api_response.public_id,
            width: api_response.width,
            height: api_response.height,
            format: api_response.format,
            bytes: api_response.bytes,
            created_at: api_response.created_at,
            tags: api_response.tags,
        })
    }
}
