//! Model loading for ONNX Runtime
//!
//! Locates the digit model on disk, optionally verifies its checksum and
//! wraps the ONNX session behind [`DigitModel`].

use anyhow::{Context, Result};
use ndarray::{ArrayD, IxDyn};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::classifier::{top_class, DigitModel, Prediction, UnavailableModel};
use super::preprocess::{DigitTensor, TENSOR_LEN};
use crate::config::ModelSettings;
use crate::error::InferenceError;

/// File name looked up in the data directory when no path is configured
pub const DEFAULT_MODEL_FILE: &str = "digits.onnx";

/// Number of classes the model must score
pub const NUM_CLASSES: usize = 10;

/// How byte intensities are fed to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputScaling {
    /// Divide by 255, values in [0, 1]
    #[default]
    Unit,
    /// Raw intensities in [0, 255]
    Raw,
}

impl InputScaling {
    fn apply(&self, value: u8) -> f32 {
        match self {
            InputScaling::Unit => value as f32 / 255.0,
            InputScaling::Raw => value as f32,
        }
    }
}

/// Finds and opens the digit model
pub struct ModelLoader {
    settings: ModelSettings,
}

impl ModelLoader {
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }

    /// Configured path, or `<data dir>/models/digits.onnx`
    pub fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.settings.path {
            return Ok(path.clone());
        }
        let data_dir = crate::storage::get_data_dir()?;
        Ok(data_dir.join("models").join(DEFAULT_MODEL_FILE))
    }

    /// Load the ONNX model
    pub fn load(&self) -> Result<OnnxDigitModel> {
        let path = self.resolve_path()?;
        if !path.exists() {
            anyhow::bail!("Model file not found at {:?}", path);
        }

        if let Some(expected) = &self.settings.sha256 {
            verify_checksum(&path, expected)?;
        }

        OnnxDigitModel::new(&path, self.settings.input_scaling, self.settings.intra_threads)
    }

    /// Load the model, falling back to a stand-in that reports every
    /// inference as unavailable
    pub fn load_or_unavailable(&self) -> Box<dyn DigitModel> {
        match self.load() {
            Ok(model) => Box::new(model),
            Err(e) => Box::new(UnavailableModel::new(format!("{:#}", e))),
        }
    }
}

/// Compare a file's SHA-256 with the expected hex digest
pub fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read model file {:?}", path))?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    let hash = format!("{:x}", hasher.finalize());

    if !hash.eq_ignore_ascii_case(expected.trim()) {
        anyhow::bail!(
            "Checksum mismatch for {:?}: expected {}, got {}",
            path,
            expected,
            hash
        );
    }

    info!("Checksum verified for {:?}", path);
    Ok(())
}

/// Digit classifier backed by an ONNX Runtime session
pub struct OnnxDigitModel {
    session: Session,
    input_name: String,
    output_name: String,
    input_shape: Vec<usize>,
    scaling: InputScaling,
    name: String,
}

impl OnnxDigitModel {
    /// Open a model file and check that its input holds a 28x28 image
    pub fn new(model_path: &Path, scaling: InputScaling, intra_threads: usize) -> Result<Self> {
        info!("Loading ONNX model from {:?}", model_path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads.max(1))?
            .commit_from_file(model_path)
            .context("Failed to load ONNX model")?;

        let input = session
            .inputs
            .first()
            .context("Model declares no inputs")?;
        let output = session
            .outputs
            .first()
            .context("Model declares no outputs")?;

        let declared = extract_shape(&input.input_type);
        let input_shape = resolve_input_shape(&declared)?;
        let input_name = input.name.clone();
        let output_name = output.name.clone();

        info!(
            "Model loaded. Input: {} {:?}, Output: {}",
            input_name, declared, output_name
        );

        let name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        Ok(Self {
            session,
            input_name,
            output_name,
            input_shape,
            scaling,
            name,
        })
    }

    /// Shape the tensor is reshaped to before inference
    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }
}

impl DigitModel for OnnxDigitModel {
    fn predict(&mut self, tensor: &DigitTensor) -> Result<Prediction, InferenceError> {
        let input = tensor_to_input(tensor, &self.input_shape, self.scaling)?;
        let input = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;
        let (_, scores) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        if scores.len() != NUM_CLASSES {
            return Err(InferenceError::UnexpectedOutput(scores.len()));
        }

        let (class, confidence) =
            top_class(scores).ok_or_else(|| InferenceError::Runtime("model returned no finite scores".to_string()))?;

        debug!("Scores: {:?}", scores);

        Ok(Prediction {
            class,
            confidence: Some(confidence),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Replace dynamic dimensions with 1 and check the element count
pub fn resolve_input_shape(declared: &[i64]) -> Result<Vec<usize>, InferenceError> {
    let shape: Vec<usize> = declared
        .iter()
        .map(|&d| if d <= 0 { 1 } else { d as usize })
        .collect();

    let elements = shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));

    if shape.is_empty() || elements != Some(TENSOR_LEN) {
        warn!("Unsupported model input shape {:?}", declared);
        return Err(InferenceError::ShapeMismatch {
            shape: declared.to_vec(),
            expected: TENSOR_LEN,
        });
    }

    Ok(shape)
}

/// Convert a byte tensor into the network's float input
pub fn tensor_to_input(
    tensor: &DigitTensor,
    shape: &[usize],
    scaling: InputScaling,
) -> Result<ArrayD<f32>, InferenceError> {
    let values: Vec<f32> = tensor.as_slice().iter().map(|&v| scaling.apply(v)).collect();
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| InferenceError::ShapeMismatch {
        shape: shape.iter().map(|&d| d as i64).collect(),
        expected: TENSOR_LEN,
    })
}

/// Extract shape from ONNX value type
fn extract_shape(value_type: &ort::value::ValueType) -> Vec<i64> {
    if let Some(shape) = value_type.tensor_shape() {
        shape.iter().copied().collect()
    } else {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_resolve_input_shape() {
        assert_eq!(resolve_input_shape(&[-1, 1, 28, 28]).unwrap(), vec![1, 1, 28, 28]);
        assert_eq!(resolve_input_shape(&[1, 784]).unwrap(), vec![1, 784]);
        assert_eq!(resolve_input_shape(&[-1, 28, 28, 1]).unwrap(), vec![1, 28, 28, 1]);

        let err = resolve_input_shape(&[1, 3, 32, 32]).unwrap_err();
        assert!(matches!(err, InferenceError::ShapeMismatch { expected: 784, .. }));
        assert!(resolve_input_shape(&[]).is_err());
    }

    #[test]
    fn test_resolve_input_shape_overflow() {
        let err = resolve_input_shape(&[i64::MAX, i64::MAX, 28, 28]).unwrap_err();
        assert!(matches!(err, InferenceError::ShapeMismatch { expected: 784, .. }));
    }

    #[test]
    fn test_tensor_to_input_scaling() {
        let tensor = DigitTensor::filled(255);

        let unit = tensor_to_input(&tensor, &[1, 1, 28, 28], InputScaling::Unit).unwrap();
        assert_eq!(unit.shape(), &[1, 1, 28, 28]);
        assert!(unit.iter().all(|&v| (v - 1.0).abs() < f32::EPSILON));

        let raw = tensor_to_input(&tensor, &[1, 784], InputScaling::Raw).unwrap();
        assert!(raw.iter().all(|&v| v == 255.0));
    }

    #[test]
    fn test_tensor_to_input_rejects_wrong_shape() {
        let tensor = DigitTensor::filled(0);
        assert!(tensor_to_input(&tensor, &[1, 10], InputScaling::Unit).is_err());
    }

    #[test]
    fn test_verify_checksum() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        // SHA-256 of "abc"
        let digest = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert!(verify_checksum(file.path(), digest).is_ok());
        assert!(verify_checksum(file.path(), &digest.to_uppercase()).is_ok());
        assert!(verify_checksum(file.path(), "00").is_err());
    }

    #[test]
    fn test_missing_model_falls_back() {
        let settings = ModelSettings {
            path: Some(PathBuf::from("/nonexistent/digits.onnx")),
            ..Default::default()
        };
        let loader = ModelLoader::new(settings);

        assert!(loader.load().is_err());

        let mut model = loader.load_or_unavailable();
        assert_eq!(model.name(), "unavailable");
        assert!(matches!(
            model.predict(&DigitTensor::filled(0)),
            Err(InferenceError::Unavailable(_))
        ));
    }

    #[test]
    fn test_configured_path_wins() {
        let settings = ModelSettings {
            path: Some(PathBuf::from("/models/custom.onnx")),
            ..Default::default()
        };
        let loader = ModelLoader::new(settings);
        assert_eq!(loader.resolve_path().unwrap(), PathBuf::from("/models/custom.onnx"));
    }
}
