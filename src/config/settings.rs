//! Relay settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Multipart framing headroom allowed on top of the image ceiling
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub asset_store: AssetStoreConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `development` exposes internal error details in responses
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Empty means any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_environment() -> String {
    "production".to_string()
}

/// Bearer authentication for the upload route
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub upload_token: Option<String>,
}

/// Asset store account credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetStoreConfig {
    pub cloud_name: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    #[serde(default = "default_asset_store_base")]
    pub api_base: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_asset_store_base() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}

fn default_timeout() -> u64 {
    60000
}

/// Upload shaping rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_base_folder")]
    pub base_folder: String,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    #[serde(default = "default_true")]
    pub group_by_metadata: bool,
    #[serde(default = "default_group_keys")]
    pub group_keys: Vec<String>,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    #[serde(default = "default_caption_keys")]
    pub caption_keys: Vec<String>,
    #[serde(default = "default_alt_keys")]
    pub alt_keys: Vec<String>,
    #[serde(default = "default_excluded_keys")]
    pub excluded_keys: Vec<String>,
}

fn default_base_folder() -> String {
    "plugin-uploads".to_string()
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_group_keys() -> Vec<String> {
    vec!["groupId".to_string(), "group".to_string()]
}

fn default_tags() -> Vec<String> {
    vec!["plugin-upload".to_string(), "auto-upload".to_string()]
}

// Every key name observed for the built-in fields across plugin versions
fn default_caption_keys() -> Vec<String> {
    vec![
        "context.custom.title".to_string(),
        "Title (caption)".to_string(),
        "title".to_string(),
        "caption".to_string(),
    ]
}

fn default_alt_keys() -> Vec<String> {
    vec![
        "context.custom.alt".to_string(),
        "Description (alt)".to_string(),
        "description".to_string(),
        "alt".to_string(),
    ]
}

fn default_excluded_keys() -> Vec<String> {
    vec!["timestamp".to_string(), "baseName".to_string()]
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_folder: default_base_folder(),
            max_image_bytes: default_max_image_bytes(),
            group_by_metadata: true,
            group_keys: default_group_keys(),
            tags: default_tags(),
            caption_keys: default_caption_keys(),
            alt_keys: default_alt_keys(),
            excluded_keys: default_excluded_keys(),
        }
    }
}

/// Completion provider request shape
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_completion_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: default_completion_base(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            timeout_ms: default_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    ///
    /// Fails when the asset store credentials are absent, so the process
    /// never binds a listener without them.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("server.environment", default_environment())?
            .add_source(File::with_name(path.as_ref().to_str().unwrap_or("config/default")).required(false))
            // Override with environment variables (e.g. RELAY__ASSET_STORE__API_SECRET)
            .add_source(
                Environment::with_prefix("RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            // Hosting platforms hand out the listening port as a bare PORT
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        let credentials = [
            ("asset_store.cloud_name", &self.asset_store.cloud_name),
            ("asset_store.api_key", &self.asset_store.api_key),
            ("asset_store.api_secret", &self.asset_store.api_secret),
        ];
        for (key, value) in credentials {
            if value.trim().is_empty() {
                return Err(invalid(&format!("{} is required", key)));
            }
        }

        if self.upload.max_image_bytes == 0 {
            return Err(invalid("upload.max_image_bytes must be greater than 0"));
        }

        if self.completion.model.trim().is_empty() {
            return Err(invalid("completion.model cannot be empty"));
        }

        Ok(())
    }

    /// Upload secret, ignoring a configured-but-blank value
    pub fn upload_token(&self) -> Option<&str> {
        self.auth
            .upload_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    /// Whole-request ceiling for the upload route
    pub fn upload_body_limit(&self) -> usize {
        self.upload.max_image_bytes + MULTIPART_OVERHEAD_BYTES
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}

impl Settings {
    /// Settings with placeholder credentials, for tests and local tooling
    pub fn with_credentials(cloud_name: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                environment: default_environment(),
                cors_allowed_origins: vec![],
            },
            auth: AuthConfig::default(),
            asset_store: AssetStoreConfig {
                cloud_name: cloud_name.to_string(),
                api_key: api_key.to_string(),
                api_secret: api_secret.to_string(),
                api_base: default_asset_store_base(),
                timeout_ms: default_timeout(),
            },
            upload: UploadConfig::default(),
            completion: CompletionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
