//! Unit tests for configuration loading

use std::io::Write;

use asset_relay::{config::Settings, AppError};
use serial_test::serial;

const OVERRIDE_VARS: [&str; 3] = ["PORT", "RELAY__ASSET_STORE__API_SECRET", "RELAY__SERVER__ENVIRONMENT"];

/// Sets process environment for one test and clears it again on drop
struct EnvGuard;

impl EnvGuard {
    fn set(vars: &[(&str, &str)]) -> Self {
        clear_overrides();
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        EnvGuard
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        clear_overrides();
    }
}

fn clear_overrides() {
    for key in OVERRIDE_VARS {
        std::env::remove_var(key);
    }
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
#[serial]
fn test_load_from_file() {
    let file = config_file(
        r#"
[server]
environment = "development"

[auth]
upload_token = "s3cret"

[asset_store]
cloud_name = "demo"
api_key = "1234"
api_secret = "abcd"

[upload]
base_folder = "designs"
group_by_metadata = false
tags = ["figma"]

[completion]
model = "claude-test"
max_tokens = 300
"#,
    );

    let _env = EnvGuard::set(&[]);
    let settings = Settings::load_from_path(file.path()).unwrap();
    assert!(settings.server.is_development());
    assert_eq!(settings.upload_token(), Some("s3cret"));
    assert_eq!(settings.asset_store.cloud_name, "demo");
    assert_eq!(settings.asset_store.api_base, "https://api.cloudinary.com/v1_1");
    assert_eq!(settings.upload.base_folder, "designs");
    assert!(!settings.upload.group_by_metadata);
    assert_eq!(settings.upload.tags, vec!["figma"]);
    // untouched upload keys keep their defaults
    assert_eq!(settings.upload.max_image_bytes, 10 * 1024 * 1024);
    assert_eq!(settings.upload.excluded_keys, vec!["timestamp", "baseName"]);
    assert_eq!(settings.completion.model, "claude-test");
    assert_eq!(settings.completion.max_tokens, 300);
    assert_eq!(settings.completion.api_version, "2023-06-01");
    assert_eq!(settings.logging.format, "json");
}

#[test]
#[serial]
fn test_missing_credentials_fail_fast() {
    let file = config_file(
        r#"
[asset_store]
cloud_name = "demo"
api_key = "1234"
"#,
    );

    let _env = EnvGuard::set(&[]);
    assert!(matches!(
        Settings::load_from_path(file.path()),
        Err(AppError::Config(_))
    ));
}

#[test]
#[serial]
fn test_blank_credentials_fail_fast() {
    let file = config_file(
        r#"
[asset_store]
cloud_name = "demo"
api_key = ""
api_secret = "abcd"
"#,
    );

    let _env = EnvGuard::set(&[]);
    assert!(matches!(
        Settings::load_from_path(file.path()),
        Err(AppError::Config(_))
    ));
}

#[test]
#[serial]
fn test_upload_body_limit_adds_multipart_headroom() {
    let settings = Settings::with_credentials("demo", "key", "secret");
    assert_eq!(
        settings.upload_body_limit(),
        settings.upload.max_image_bytes + asset_relay::config::MULTIPART_OVERHEAD_BYTES
    );
}

#[test]
#[serial]
fn test_environment_overrides_file_and_defaults() {
    let file = config_file(
        r#"
[server]
port = 3000

[asset_store]
cloud_name = "demo"
api_key = "1234"
"#,
    );

    let _env = EnvGuard::set(&[
        ("PORT", "8081"),
        ("RELAY__ASSET_STORE__API_SECRET", "from-env"),
        ("RELAY__SERVER__ENVIRONMENT", "development"),
    ]);

    let settings = Settings::load_from_path(file.path()).unwrap();
    assert_eq!(settings.server.port, 8081);
    assert_eq!(settings.asset_store.api_secret, "from-env");
    assert!(settings.server.is_development());
    assert_eq!(settings.asset_store.api_key, "1234");
}
