use crate::core::error::GalleryError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Platforms up to this SDK level use the single broad storage permission.
pub const LEGACY_MAX_SDK: i32 = 32;

/// Request code tagging our `requestPermissions` call, so the callback can be told apart.
pub const GRANT_REQUEST_CODE: i32 = 1001;

pub const PICKER_REQUEST_CODE: i32 = 1002;

pub const LOG_TAG: &str = "MediaGate";

/// Keys are lowercase and every group carries `#[serde(default)]`, so a file
/// may leave out whole groups or keys. A value of the wrong type anywhere
/// rejects the whole file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GalleryConfig {
    #[serde(default = "default_package_id")]
    pub package_id: String,

    /// Open the gallery as soon as the screen is created instead of waiting for a tap.
    #[serde(default)]
    pub auto_open: bool,

    /// Crash reporting stays off while this is empty.
    #[serde(default)]
    pub sentry_dsn: String,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub picker: PickerConfig,

    #[serde(default)]
    pub strings: StringsConfig,
}

fn default_package_id() -> String {
    "com.example.gallery".to_string()
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            package_id: default_package_id(),
            auto_open: false,
            sentry_dsn: String::new(),
            platform: PlatformConfig::default(),
            picker: PickerConfig::default(),
            strings: StringsConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlatformConfig {
    #[serde(default = "default_legacy_max_sdk")]
    pub legacy_max_sdk: i32,
    #[serde(default = "default_grant_request_code")]
    pub grant_request_code: i32,
    #[serde(default = "default_picker_request_code")]
    pub picker_request_code: i32,
}

fn default_legacy_max_sdk() -> i32 {
    LEGACY_MAX_SDK
}

fn default_grant_request_code() -> i32 {
    GRANT_REQUEST_CODE
}

fn default_picker_request_code() -> i32 {
    PICKER_REQUEST_CODE
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            legacy_max_sdk: default_legacy_max_sdk(),
            grant_request_code: default_grant_request_code(),
            picker_request_code: default_picker_request_code(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PickerConfig {
    #[serde(default = "default_legacy_mime_type")]
    pub legacy_mime_type: String,
}

fn default_legacy_mime_type() -> String {
    "image/*".to_string()
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            legacy_mime_type: default_legacy_mime_type(),
        }
    }
}

/// User-facing texts for the two prompts and the error notice.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StringsConfig {
    pub permission_required: String,
    pub permission_required_message: String,
    pub feature_is_unavailable: String,
    pub ok: String,
    pub cancel: String,
    pub setting: String,
    pub unknown_error: String,
}

impl Default for StringsConfig {
    fn default() -> Self {
        Self {
            permission_required: "Permission required".to_string(),
            permission_required_message:
                "Access to your photos and videos is needed to pick an image.".to_string(),
            feature_is_unavailable:
                "This feature is unavailable because it requires access to your media. Please allow it in Settings."
                    .to_string(),
            ok: "OK".to_string(),
            cancel: "Cancel".to_string(),
            setting: "Settings".to_string(),
            unknown_error: "Unknown error!".to_string(),
        }
    }
}

pub fn parse_config_str(content: &str) -> anyhow::Result<GalleryConfig> {
    let config = toml::from_str::<GalleryConfig>(content)
        .map_err(|e| GalleryError::Config(e.message().to_string()))?;
    Ok(config)
}

/// Read the config at `path`. A missing or malformed file yields the default
/// config so the screen always comes up.
pub fn parse_config(path: impl AsRef<Path>) -> GalleryConfig {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::info!("No config at {} ({}), using defaults", path.display(), e);
            return GalleryConfig::default();
        }
    };
    match parse_config_str(&content) {
        Ok(config) => config,
        Err(e) => {
            // Config malformed, use the default config and the user can fix it again
            log::warn!("Malformed config at {}: {}", path.display(), e);
            GalleryConfig::default()
        }
    }
}
