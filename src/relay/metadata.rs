//! Metadata parsing and the mapping onto asset store fields

use serde_json::{Map, Value};

use crate::config::UploadConfig;
use crate::error::{AppError, Result};

/// Grouping identifier used when no grouping key is present
pub const UNKNOWN_GROUP: &str = "unknown";

/// Fallback object identifier for filenames that sanitize to nothing
pub const DEFAULT_OBJECT_ID: &str = "image";

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "tif", "tiff", "avif", "heic",
];

/// Flat, ordered key/value metadata supplied with an upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Parse the `metadata` form field
    ///
    /// Absent or blank input is an empty mapping. Key order follows the JSON
    /// document. Numbers and booleans are kept as their JSON text, `null` is
    /// dropped, and nested values are rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Self::default()),
        };

        let object: Map<String, Value> = serde_json::from_str(raw)
            .map_err(|e| AppError::InvalidMetadata(format!("expected a JSON object: {}", e)))?;

        let mut entries = Vec::with_capacity(object.len());
        for (key, value) in object {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(AppError::InvalidMetadata(format!(
                        "value for '{}' must be a string",
                        key
                    )));
                }
            };
            entries.push((key, value));
        }

        Ok(Self { entries })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Non-empty value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value among `keys`, in the order given
    pub fn first_of(&self, keys: &[String]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Metadata partitioned into built-in fields and free-form context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSplit {
    pub caption: Option<String>,
    pub alt: Option<String>,
    pub context: Vec<(String, String)>,
}

impl MetadataSplit {
    pub fn new(metadata: &Metadata, rules: &UploadConfig) -> Self {
        let reserved = |key: &str| {
            rules
                .excluded_keys
                .iter()
                .chain(&rules.caption_keys)
                .chain(&rules.alt_keys)
                .any(|k| k == key)
        };

        let context = metadata
            .iter()
            .filter(|(key, value)| !value.is_empty() && !reserved(key))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Self {
            caption: metadata.first_of(&rules.caption_keys).map(str::to_string),
            alt: metadata.first_of(&rules.alt_keys).map(str::to_string),
            context,
        }
    }

    /// Free-form pairs as `key=value|key=value`
    pub fn context_string(&self) -> String {
        serialize_context(&self.context)
    }
}

pub fn serialize_context(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("|")
}

/// Overlay the built-in fields onto free-form pairs
///
/// A built-in replaces a same-named pair in place; otherwise it is appended.
pub fn merge_builtins(
    context: &[(String, String)],
    caption: Option<&str>,
    alt: Option<&str>,
) -> Vec<(String, String)> {
    let mut merged = context.to_vec();
    for (key, value) in [("caption", caption), ("alt", alt)] {
        let Some(value) = value else { continue };
        match merged.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => merged.push((key.to_string(), value.to_string())),
        }
    }
    merged
}

/// Storage object identifier for a client filename
///
/// Keeps only the last path segment and strips one trailing image extension,
/// ignoring case.
pub fn object_id(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let stem = match name.rsplit_once('.') {
        Some((stem, ext))
            if IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => name,
    };

    if stem.is_empty() {
        DEFAULT_OBJECT_ID.to_string()
    } else {
        stem.to_string()
    }
}

/// Grouping identifier, or `None` when grouping is disabled
pub fn grouping_id(metadata: &Metadata, rules: &UploadConfig) -> Option<String> {
    if !rules.group_by_metadata {
        return None;
    }
    Some(
        metadata
            .first_of(&rules.group_keys)
            .unwrap_or(UNKNOWN_GROUP)
            .to_string(),
    )
}

/// `<base>/<group>`, or just `<base>` without a group
pub fn target_folder(base: &str, group: Option<&str>) -> String {
    let base = base.trim_matches('/');
    match group.map(|g| g.trim_matches('/')) {
        Some(group) if !group.is_empty() && !base.is_empty() => format!("{}/{}", base, group),
        Some(group) if !group.is_empty() => group.to_string(),
        _ => base.to_string(),
    }
}
