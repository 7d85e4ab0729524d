//! Application configuration module.
//!
//! Handles loading, validating, and merging `imgshrink.toml`. Stock defaults
//! are the base layer; a user file overrides only the keys it names, and
//! command-line flags override both.
//!
//! ## Config File Location
//!
//! `imgshrink.toml` is looked up in the current directory, or passed
//! explicitly with `--config <FILE>`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [compression]
//! max_size_mb = 1.0            # Target output size (0.1-10)
//! max_width_or_height = 1920   # Longest edge in pixels (100-4096)
//! quality = 0.8                # Encoder quality hint (0.1-1.0)
//! use_web_worker = true        # Compress on a blocking worker thread
//! max_iteration = 10           # Size-search iteration cap
//! # file_type = "image/webp"   # Force an output type
//! # exif_orientation = 1       # Force an EXIF orientation (1-8)
//!
//! [output]
//! download_dir = "."           # Where downloads are written
//! download_prefix = "compressed_"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::compression::{CompressionOptions, QualityHint};
use crate::workbench::{Controls, DOWNLOAD_PREFIX};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in a directory by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "imgshrink.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `imgshrink.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Defaults for every compression run.
    pub compression: CompressionConfig,
    /// Where and how results are saved.
    pub output: OutputConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.compression;
        if !c.max_size_mb.is_finite() || c.max_size_mb <= 0.0 {
            return Err(ConfigError::Validation(
                "compression.max_size_mb must be a positive number".into(),
            ));
        }
        if c.max_width_or_height == 0 {
            return Err(ConfigError::Validation(
                "compression.max_width_or_height must be non-zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.quality) {
            return Err(ConfigError::Validation(
                "compression.quality must be 0-1".into(),
            ));
        }
        if c.exif_orientation.is_some_and(|o| !(1..=8).contains(&o)) {
            return Err(ConfigError::Validation(
                "compression.exif_orientation must be 1-8".into(),
            ));
        }
        if let Some(t) = &c.file_type {
            if !t.starts_with("image/") {
                return Err(ConfigError::Validation(format!(
                    "compression.file_type must be an image MIME type, got {t:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Compression defaults. The first three seed the range controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    pub max_size_mb: f64,
    pub max_width_or_height: u32,
    pub quality: f32,
    pub use_web_worker: bool,
    pub max_iteration: u32,
    /// Output MIME type. Absent means "same as input".
    pub file_type: Option<String>,
    pub exif_orientation: Option<u8>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        let controls = Controls::default();
        Self {
            max_size_mb: controls.max_size_mb(),
            max_width_or_height: controls.max_dimension(),
            quality: controls.quality(),
            use_web_worker: true,
            max_iteration: crate::compression::rust_backend::DEFAULT_MAX_ITERATION,
            file_type: None,
            exif_orientation: None,
        }
    }
}

impl CompressionConfig {
    /// Initial range control values, snapped into their ranges.
    pub fn to_controls(&self) -> Controls {
        Controls::new(self.max_size_mb, self.max_width_or_height, self.quality)
    }

    /// Options the range controls do not drive.
    pub fn to_base_options(&self) -> CompressionOptions {
        let mut options = CompressionOptions::new(self.max_size_mb)
            .with_max_width_or_height(self.max_width_or_height)
            .with_web_worker(self.use_web_worker);
        options.quality = Some(QualityHint::new(self.quality));
        options.max_iteration = Some(self.max_iteration);
        options.file_type = self.file_type.clone();
        options.exif_orientation = self.exif_orientation;
        options
    }
}

/// Download settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub download_dir: PathBuf,
    pub download_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            download_prefix: DOWNLOAD_PREFIX.to_string(),
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `imgshrink.toml` from `dir`, falling back to stock defaults.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    let overlay = load_raw_config(&dir.join(CONFIG_FILE_NAME))?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Load an explicitly named config file. Unlike [`load_config`], a missing
/// file is an error.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `imgshrink.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgshrink configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as imgshrink.toml in the working directory, or pass it
# with --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Compression
# ---------------------------------------------------------------------------
[compression]
# Target output size in megabytes. The interactive control snaps this to
# 0.1-10 in steps of 0.1.
max_size_mb = 1.0

# Longest edge of the output in pixels (100-4096). Images are never upscaled.
max_width_or_height = 1920

# Encoder quality hint, 0-1. JPEG honours it; PNG and WebP are lossless.
quality = 0.8

# Run compression on a blocking worker thread instead of inline.
use_web_worker = true

# How many shrink-and-re-encode rounds to try while the output is over budget.
max_iteration = 10

# Force an output type. Unsupported types are written as PNG.
# file_type = "image/webp"

# Override the EXIF orientation (1-8) instead of reading it from the file.
# exif_orientation = 1

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory downloads are saved to.
download_dir = "."

# Prepended to the original file name on download.
download_prefix = "compressed_"
"##
}
