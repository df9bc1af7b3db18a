//! Tool configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file overrides only the keys it names. Command-line
//! flags are applied on top of the resolved config by the binary.
//!
//! ## Config File Location
//!
//! `config.toml` in the working directory is picked up automatically; any
//! other file can be passed with `--config <path>`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [batch]
//! pattern = "*.png"         # File names to pick up in the source directory
//! extension = "jpg"         # Output extension, selects the encoder
//! quality = 80              # Lossy encoding quality (1-100)
//! # mode = "rgb"            # Convert before encoding: gray | rgb | rgba
//! max_edge = 0              # Downscale bound on the longer edge, 0 = keep size
//!
//! [gradient]
//! width = 600
//! height = 300
//! start = "#0080ff"         # Top row
//! end = "#ffffff"           # Bottom row
//!
//! [quantize]
//! colors = 256              # Palette size (1-256)
//! posterize_bits = 0        # 0 = off, 1-8 = bits kept per channel
//! # seed = 42               # Seed for random palettes
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [batch]
//! extension = "webp"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OutputFormat, Quality};
use crate::raster::{PixelMode, Rgb, parse_color};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
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

/// Tool configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RasterConfig {
    /// Batch transcoding defaults.
    pub batch: BatchConfig,
    /// Gradient synthesis defaults.
    pub gradient: GradientConfig,
    /// Palette quantization defaults.
    pub quantize: QuantizeConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl RasterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.batch.quality) {
            return Err(ConfigError::Validation(
                "batch.quality must be 1-100".into(),
            ));
        }
        if OutputFormat::from_extension(&self.batch.extension).is_none() {
            return Err(ConfigError::Validation(format!(
                "batch.extension {:?} has no encoder (use jpg, png, tif, webp or avif)",
                self.batch.extension
            )));
        }
        if self.batch.pattern.is_empty() {
            return Err(ConfigError::Validation(
                "batch.pattern must not be empty".into(),
            ));
        }
        if self.batch.mode == Some(PixelMode::Indexed8) {
            return Err(ConfigError::Validation(
                "batch.mode must be gray, rgb or rgba".into(),
            ));
        }
        if self.gradient.width == 0 || self.gradient.height == 0 {
            return Err(ConfigError::Validation(
                "gradient.width and gradient.height must be non-zero".into(),
            ));
        }
        for (key, value) in [
            ("gradient.start", &self.gradient.start),
            ("gradient.end", &self.gradient.end),
        ] {
            parse_color(value).map_err(|e| ConfigError::Validation(format!("{key}: {e}")))?;
        }
        if !(1..=256).contains(&self.quantize.colors) {
            return Err(ConfigError::Validation(
                "quantize.colors must be 1-256".into(),
            ));
        }
        if self.quantize.posterize_bits > 8 {
            return Err(ConfigError::Validation(
                "quantize.posterize_bits must be 0-8".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Batch transcoding defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Shell-style file name pattern (`*` and `?`).
    pub pattern: String,
    /// Output extension without the dot.
    pub extension: String,
    /// Encoding quality for lossy formats (1-100).
    pub quality: u32,
    /// Pixel mode to convert to before encoding.
    pub mode: Option<PixelMode>,
    /// Longer-edge bound; 0 keeps the source size.
    pub max_edge: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pattern: "*.png".to_string(),
            extension: "jpg".to_string(),
            quality: 80,
            mode: Some(PixelMode::Rgb24),
            max_edge: 0,
        }
    }
}

impl BatchConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

/// Gradient synthesis defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradientConfig {
    pub width: u32,
    pub height: u32,
    /// Top color: `#rrggbb`, `#rgb`, `r,g,b` or a color name.
    pub start: String,
    /// Bottom color.
    pub end: String,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 300,
            start: "#0080ff".to_string(),
            end: "#ffffff".to_string(),
        }
    }
}

impl GradientConfig {
    /// Parsed `(start, end)` colors. Always succeeds on a validated config.
    pub fn colors(&self) -> Result<(Rgb, Rgb), ConfigError> {
        let parse = |key: &str, value: &str| {
            parse_color(value).map_err(|e| ConfigError::Validation(format!("{key}: {e}")))
        };
        Ok((
            parse("gradient.start", &self.start)?,
            parse("gradient.end", &self.end)?,
        ))
    }
}

/// Palette quantization defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuantizeConfig {
    /// Maximum palette size.
    pub colors: usize,
    /// Bits kept per channel before palette selection; 0 disables posterize.
    pub posterize_bits: u8,
    /// Seed for random palettes. Absent means a fresh seed every run.
    pub seed: Option<u64>,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            colors: 256,
            posterize_bits: 0,
            seed: None,
        }
    }
}

impl QuantizeConfig {
    /// `posterize_bits` with 0 mapped to "off".
    pub fn posterize(&self) -> Option<u8> {
        (self.posterize_bits > 0).then_some(self.posterize_bits)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RasterConfig::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value.
///
/// Returns `Err` if the file is missing or contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RasterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RasterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// A missing file means stock defaults. Merges user values on top of stock
/// defaults, rejects unknown keys, and validates the result.
pub fn load_config(dir: &Path) -> Result<RasterConfig, ConfigError> {
    let path = dir.join("config.toml");
    let overlay = if path.exists() {
        Some(load_raw_config(&path)?)
    } else {
        None
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Load config from an explicit file, which must exist.
pub fn load_config_file(path: &Path) -> Result<RasterConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# rasterkit Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# config.toml in the working directory is read automatically; pass
# --config <file> to use another one. Command-line flags win over this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Batch transcoding
# ---------------------------------------------------------------------------
[batch]
# Shell-style pattern matched against file names in the source directory.
# `*` matches any run of characters, `?` exactly one.
pattern = "*.png"

# Output extension. Also picks the encoder: jpg, png, tif, webp, avif.
extension = "jpg"

# Encoding quality for lossy formats (1 = worst, 100 = best).
quality = 80

# Pixel mode to convert to before encoding: gray, rgb or rgba.
mode = "rgb"

# Downscale so the longer edge is at most this many pixels. 0 keeps the size.
max_edge = 0

# ---------------------------------------------------------------------------
# Gradient
# ---------------------------------------------------------------------------
[gradient]
width = 600
height = 300

# Colors as "#rrggbb", "#rgb", "r,g,b" or a name (black, white, red, ...).
start = "#0080ff"
end = "#ffffff"

# ---------------------------------------------------------------------------
# Palette quantization
# ---------------------------------------------------------------------------
[quantize]
# Maximum number of palette entries (1-256).
colors = 256

# Bits kept per channel before building the palette. 0 = off, 1-8.
posterize_bits = 0

# Seed for random palettes. Omit for a different palette every run.
# seed = 42

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel batch workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
