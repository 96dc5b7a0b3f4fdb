//! Common traits and types for the upstream providers

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::relay::metadata::{merge_builtins, serialize_context};

/// Upload options sent to the asset store alongside the image bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpload {
    /// Object identifier, used verbatim by the store
    pub public_id: String,

    /// Target folder path
    pub folder: String,

    /// Resource kind; selects the store's upload endpoint
    pub resource_type: String,

    /// Free-form metadata pairs in source order
    pub context: Vec<(String, String)>,

    /// Built-in caption field
    pub caption: Option<String>,

    /// Built-in alt text field
    pub alt: Option<String>,

    pub tags: Vec<String>,

    /// Replace an existing object with the same identifier
    pub overwrite: bool,
}

impl AssetUpload {
    /// Context parameter as the store receives it, with the built-in fields
    /// merged over any same-named free-form key
    pub fn provider_context(&self) -> String {
        let merged = merge_builtins(
            &self.context,
            self.caption.as_deref(),
            self.alt.as_deref(),
        );
        serialize_context(&merged)
    }
}

/// Descriptor of a stored asset, as returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    pub url: String,
    pub public_id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub bytes: u64,
    pub created_at: String,
    pub tags: Vec<String>,
}

/// Trait for asset storage providers
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Store one image, creating or overwriting `upload.public_id`
    async fn upload(&self, upload: AssetUpload, image: Vec<u8>) -> Result<StoredAsset>;
}

/// Trait for text-generation providers
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Generate text for a single user prompt, authenticating with the
    /// caller's own provider key
    async fn complete(&self, prompt: &str, api_key: &str) -> Result<String>;
}
