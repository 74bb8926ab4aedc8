//! Application Configuration
//!
//! User settings stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::canvas::CanvasSize;
use crate::vision::{InputScaling, PreprocessConfig};

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Drawing surface settings
    pub canvas: CanvasSettings,
    /// Pixel normalization settings
    pub preprocess: PreprocessConfig,
    /// Model settings
    pub model: ModelSettings,
}

/// Drawing surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    /// Canvas width in points
    pub width: u32,
    /// Canvas height in points
    pub height: u32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        let size = CanvasSize::default();
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

impl CanvasSettings {
    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }
}

/// Digit model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Path to the ONNX file; defaults to the data directory
    pub path: Option<PathBuf>,
    /// Expected SHA-256 of the model file (hex)
    pub sha256: Option<String>,
    /// How tensor bytes are scaled before inference
    pub input_scaling: InputScaling,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: None,
            sha256: None,
            input_scaling: InputScaling::Unit,
            intra_threads: 1,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
