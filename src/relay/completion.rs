//! Completion relay: validate the prompt request and forward it

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::traits::CompletionBackend;
use crate::error::{AppError, Result};

/// Body of `POST /api/claude`
///
/// Every field is optional at the parsing stage so that missing ones can be
/// reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub prompt: Option<String>,
    pub field_type: Option<String>,
    pub target_locale: Option<String>,
    pub api_key: Option<String>,
}

/// A request with all required fields present
#[derive(Clone)]
pub struct ValidCompletion<'a> {
    pub prompt: &'a str,
    pub field_type: &'a str,
    pub target_locale: &'a str,
    pub api_key: &'a str,
}

impl CompletionRequest {
    /// Names of required fields that are absent or blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("prompt", &self.prompt),
            ("fieldType", &self.field_type),
            ("targetLocale", &self.target_locale),
            ("apiKey", &self.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> Result<ValidCompletion<'_>> {
        match (
            present(&self.prompt),
            present(&self.field_type),
            present(&self.target_locale),
            present(&self.api_key),
        ) {
            (Some(prompt), Some(field_type), Some(target_locale), Some(api_key)) => {
                Ok(ValidCompletion {
                    prompt,
                    field_type,
                    target_locale,
                    api_key,
                })
            }
            _ => Err(AppError::InvalidRequest(format!(
                "Missing required fields: {}",
                self.missing_fields().join(", ")
            ))),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Success body of `POST /api/claude`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub text: String,
}

pub async fn relay_completion(
    backend: &dyn CompletionBackend,
    request: &CompletionRequest,
) -> Result<CompletionResult> {
    let valid = request.validate()?;

    let reply = backend.complete(valid.prompt, valid.api_key).await?;
    let text = reply.trim().to_string();
    info!(
        provider = backend.name(),
        field_type = %valid.field_type,
        target_locale = %valid.target_locale,
        bytes = text.len(),
        "Completion relayed"
    );

    Ok(CompletionResult { text })
}
