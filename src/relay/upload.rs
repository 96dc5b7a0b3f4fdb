//! Upload relay: validate the incoming image and shape the store request

use serde::Serialize;
use tracing::{debug, info};

use crate::backend::traits::{AssetStore, AssetUpload, StoredAsset};
use crate::config::UploadConfig;
use crate::error::{AppError, Result};
use crate::relay::metadata::{self, Metadata, MetadataSplit};

/// Image and metadata received from the caller
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub image: Vec<u8>,
    pub metadata: Metadata,
    pub filename: String,
}

impl UploadRequest {
    pub fn validate(&self, rules: &UploadConfig) -> Result<()> {
        if self.image.is_empty() {
            return Err(AppError::InvalidRequest("Image file is empty".to_string()));
        }
        if self.image.len() > rules.max_image_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "image is {} bytes, limit is {} bytes",
                self.image.len(),
                rules.max_image_bytes
            )));
        }
        Ok(())
    }
}

/// Everything derived from an `UploadRequest` before the store is called
#[derive(Debug, Clone)]
pub struct UploadPlan {
    pub upload: AssetUpload,
    pub split: MetadataSplit,
}

impl UploadPlan {
    pub fn new(request: &UploadRequest, rules: &UploadConfig) -> Self {
        let group = metadata::grouping_id(&request.metadata, rules);
        let split = MetadataSplit::new(&request.metadata, rules);

        let mut tags = rules.tags.clone();
        if let Some(group) = &group {
            tags.push(group.clone());
        }

        let upload = AssetUpload {
            public_id: metadata::object_id(&request.filename),
            folder: metadata::target_folder(&rules.base_folder, group.as_deref()),
            resource_type: "image".to_string(),
            context: split.context.clone(),
            caption: split.caption.clone(),
            alt: split.alt.clone(),
            tags,
            overwrite: true,
        };

        Self { upload, split }
    }
}

/// Success envelope returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub success: bool,
    pub url: String,
    pub public_id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub bytes: u64,
    pub created_at: String,
    pub caption: Option<String>,
    pub alt: Option<String>,
    pub context: String,
    pub tags: Vec<String>,
}

impl UploadResult {
    pub fn new(asset: StoredAsset, split: &MetadataSplit) -> Self {
        Self {
            success: true,
            url: asset.url,
            public_id: asset.public_id,
            width: asset.width,
            height: asset.height,
            format: asset.format,
            bytes: asset.bytes,
            created_at: asset.created_at,
            caption: split.caption.clone(),
            alt: split.alt.clone(),
            context: split.context_string(),
            tags: asset.tags,
        }
    }
}

/// Validate, shape and store one image
pub async fn relay_upload(
    store: &dyn AssetStore,
    request: UploadRequest,
    rules: &UploadConfig,
) -> Result<UploadResult> {
    request.validate(rules)?;

    let plan = UploadPlan::new(&request, rules);
    debug!(
        public_id = %plan.upload.public_id,
        folder = %plan.upload.folder,
        context_keys = plan.split.context.len(),
        "Prepared asset upload"
    );

    let asset = store.upload(plan.upload, request.image).await?;
    info!(
        store = store.name(),
        public_id = %asset.public_id,
        bytes = asset.bytes,
        "Image stored"
    );

    Ok(UploadResult::new(asset, &plan.split))
}
