//! Manifest configuration module.
//!
//! Handles loading, validating, and layering `config.toml`. Values resolve in
//! three layers, each overriding the one before:
//!
//! ```text
//! stock defaults  →  config.toml  →  CLI overrides (--image-server, …)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # image_server_url = "https://iiif.example.org/iiif/3"  # absent = empty manifest
//! tile_fields = ["field_images"]
//! attribution = "Provided by the Digital Collections"
//! attribution_label = "Attribution"
//! language = "en"
//! fallback_label = "IIIF Manifest"
//! probe_timeout_secs = 5
//!
//! [[metadata]]
//! label = "Creator"
//! field = "field_creator"
//!
//! [[metadata]]
//! label = "Library"
//! field = "field_digital_library"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Manifest configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Base URL of the IIIF image server. When absent, every manifest is
    /// the empty object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_server_url: Option<String>,
    /// Fields whose attachments become canvases, in order.
    pub tile_fields: Vec<String>,
    /// Attribution text for `requiredStatement`.
    pub attribution: String,
    /// Label for `requiredStatement`.
    pub attribution_label: String,
    /// Language code for every language map in the manifest.
    pub language: String,
    /// Manifest label when neither the view nor the entity has a title.
    pub fallback_label: String,
    /// Per-probe HTTP timeout, in seconds.
    pub probe_timeout_secs: u64,
    /// Descriptive metadata table, in display order.
    pub metadata: Vec<MetadataMapping>,
}

/// One row of the metadata table: display label and source field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataMapping {
    pub label: String,
    pub field: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            image_server_url: None,
            tile_fields: vec!["field_images".to_string()],
            attribution: "Provided by the Digital Collections".to_string(),
            attribution_label: "Attribution".to_string(),
            language: "en".to_string(),
            fallback_label: "IIIF Manifest".to_string(),
            probe_timeout_secs: 5,
            metadata: vec![
                MetadataMapping {
                    label: "Creator".to_string(),
                    field: "field_creator".to_string(),
                },
                MetadataMapping {
                    label: "Library".to_string(),
                    field: "field_digital_library".to_string(),
                },
            ],
        }
    }
}

impl ManifestConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(server) = self.image_server() {
            let parsed = url::Url::parse(server).map_err(|e| {
                ConfigError::Validation(format!("image_server_url is not a URL: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Validation(
                    "image_server_url must be http or https".into(),
                ));
            }
        }
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "probe_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(ConfigError::Validation("language must not be empty".into()));
        }
        if self.tile_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "tile_fields entries must not be empty".into(),
            ));
        }
        if self
            .metadata
            .iter()
            .any(|m| m.label.trim().is_empty() || m.field.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "metadata label and field must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Configured image server, treating an empty string as unset.
    pub fn image_server(&self) -> Option<&str> {
        self.image_server_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ManifestConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, arrays included.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Apply each present overlay onto `base` in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<ManifestConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .flatten()
        .fold(base, merge_toml);
    let config: ManifestConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, layered over stock defaults and under `overrides`.
///
/// A missing file is not an error: the defaults (plus overrides) apply.
pub fn load_config(
    path: &Path,
    overrides: Option<toml::Value>,
) -> Result<ManifestConfig, ConfigError> {
    let base = stock_defaults_value();
    let file = load_raw_config(path)?;
    resolve_config(base, [file, overrides])
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# simple-iiif Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Base URL of the IIIF image server. Each attachment's public URL is
# url-encoded and appended to it to look up the image's width and height.
# Without it, every manifest is the empty object {}.
# image_server_url = "https://iiif.example.org/iiif/3"

# Fields whose files/images become canvases, in display order.
# Rows lacking a field are skipped for that field only.
tile_fields = ["field_images"]

# requiredStatement shown by viewers.
attribution = "Provided by the Digital Collections"
attribution_label = "Attribution"

# Language code used for every label and value.
language = "en"

# Manifest label when neither the view nor the entity has a title.
fallback_label = "IIIF Manifest"

# Seconds to wait for the image server before falling back to stored
# dimensions.
probe_timeout_secs = 5

# ---------------------------------------------------------------------------
# Descriptive metadata, in display order
# ---------------------------------------------------------------------------
# Reference fields (e.g. taxonomy terms) show the referenced entity's name.
[[metadata]]
label = "Creator"
field = "field_creator"

[[metadata]]
label = "Library"
field = "field_digital_library"
"##
}
