//! Render configuration
//!
//! Everything the core can be told up front, saved as RON. Missing fields
//! fall back to their defaults so hand-written files can stay short.

use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::rasterizer::{ByteOrder, ClearMode, GridConfig, Lighting, Palette, RasterOptions, RenderSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub settings: RenderSettings,
    pub palette: Palette,
    pub clear: ClearMode,
    /// Storage order of framebuffer pixels
    pub byte_order: ByteOrder,
    /// Flip rows in `end_frame` so row 0 is the top of the image
    pub flip_on_present: bool,
    pub raster: RasterOptions,
    pub lighting: Lighting,
    pub grid: Option<GridConfig>,
    /// World length of normal debug lines
    pub normal_length: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            settings: RenderSettings::default(),
            palette: Palette::default(),
            clear: ClearMode::default(),
            byte_order: ByteOrder::platform(),
            flip_on_present: false,
            raster: RasterOptions::default(),
            lighting: Lighting::default(),
            grid: None,
            normal_length: 0.25,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    SerializeError(#[from] ron::Error),
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

pub fn load_config_from_str(s: &str) -> Result<RenderConfig, ConfigError> {
    let mut config: RenderConfig = ron::from_str(s)?;
    if !(config.normal_length.is_finite() && config.normal_length > 0.0) {
        config.normal_length = RenderConfig::default().normal_length;
    }
    config.lighting.ambient = config.lighting.ambient.clamp(0.0, 1.0);
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}
