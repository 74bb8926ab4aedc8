//! Digit Sketch - draw a digit, get a prediction
//!
//! A desktop drawing surface that rasterizes each finished stroke,
//! shrinks it to a 28x28 tensor and asks an ONNX model which digit it is.

mod app;
mod canvas;
mod config;
mod dashboard;
mod error;
mod shared;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::vision::{DigitModel, ModelLoader, PreprocessConfig};

/// Digit Sketch - handwritten digit recognizer
#[derive(Parser, Debug)]
#[command(name = "digit-sketch")]
#[command(about = "Draw a digit and let a neural network guess it")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the ONNX digit model
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Use threshold remapping with this cutoff instead of inversion
    #[arg(short, long)]
    threshold: Option<u8>,

    /// Classify an image file and print the label instead of opening a window
    #[arg(long)]
    image: Option<PathBuf>,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => storage::default_config_path()?,
    };

    let mut config = load_or_create_config(&config_path);
    apply_overrides(&mut config, &args);

    if args.write_config {
        config::save_config(&config, &config_path)
            .with_context(|| format!("Failed to write config {:?}", config_path))?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    let model = ModelLoader::new(config.model.clone()).load_or_unavailable();
    info!("Using model: {}", model.name());

    if let Some(image_path) = &args.image {
        return classify_file(image_path, &config.preprocess, model);
    }

    info!("Digit Sketch starting...");
    if let Err(e) = dashboard::run_dashboard(config, model) {
        tracing::error!("Dashboard error: {}", e);
    }
    info!("Digit Sketch shutdown complete");

    Ok(())
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config(path: &Path) -> AppConfig {
    if path.exists() {
        match config::load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                return config;
            }
            Err(e) => warn!("Ignoring configuration: {:#}", e),
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

/// Command-line flags take precedence over the file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(model) = &args.model {
        config.model.path = Some(model.clone());
    }
    if let Some(threshold) = args.threshold {
        config.preprocess = PreprocessConfig {
            resample: config.preprocess.resample,
            ..PreprocessConfig::threshold(threshold)
        };
    }
}

/// Headless mode: preprocess an image file and print the predicted label
fn classify_file(path: &Path, preprocess: &PreprocessConfig, mut model: Box<dyn DigitModel>) -> Result<()> {
    let bitmap = image::open(path)
        .with_context(|| format!("Failed to open image {:?}", path))?
        .to_rgb8();

    let tensor = vision::preprocess(&bitmap, preprocess)?;
    let classified = vision::classify(model.as_mut(), &tensor)?;

    match classified.confidence {
        Some(confidence) => println!("{} ({:.1}%)", classified.label, confidence * 100.0),
        None => println!("{}", classified.label),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::RemapMode;

    #[test]
    fn test_threshold_flag_switches_remap() {
        let args = Args::parse_from(["digit-sketch", "--threshold", "90", "--model", "m.onnx"]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.preprocess.remap, RemapMode::Threshold);
        assert_eq!(config.preprocess.threshold, 90);
        assert_eq!(config.model.path, Some(PathBuf::from("m.onnx")));
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["digit-sketch"]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_create_config(&dir.path().join("absent.toml"));
        assert_eq!(config, AppConfig::default());
    }
}
