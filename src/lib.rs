//! Asset Relay
//!
//! A credential-holding relay for sandboxed design plugins: it uploads
//! images with their metadata to an asset store and forwards text-generation
//! prompts to an LLM provider, normalizing both providers' responses.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod relay;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::{
    anthropic::AnthropicBackend,
    cloudinary::CloudinaryStore,
    traits::{AssetStore, CompletionBackend},
};
use crate::config::Settings;

/// Application state shared across all handlers
///
/// Built once at startup and never mutated.
pub struct AppState {
    pub settings: Arc<Settings>,
    pub asset_store: Arc<dyn AssetStore>,
    pub completions: Arc<dyn CompletionBackend>,
}

impl AppState {
    /// Wire the HTTP provider clients described by `settings`
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let asset_store = Arc::new(CloudinaryStore::new(&settings.asset_store)?);
        let completions = Arc::new(AnthropicBackend::new(&settings.completion)?);

        Ok(Self {
            settings: Arc::new(settings),
            asset_store,
            completions,
        })
    }
}
