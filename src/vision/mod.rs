//! Vision Layer
//!
//! Converts a rendered canvas into the model's 28x28 input and asks the
//! digit model for a label.

pub mod classifier;
pub mod models;
pub mod preprocess;

pub use classifier::{classify, Classified, DigitModel, Label, Prediction, UnavailableModel, ERROR_LABEL};
pub use models::{InputScaling, ModelLoader, OnnxDigitModel};
pub use preprocess::{
    preprocess, preprocess_with_preview, DigitTensor, PreprocessConfig, Preprocessed, RemapMode,
    ResampleFilter, TENSOR_SIDE,
};

use image::GrayImage;
use std::time::Instant;
use tracing::debug;

use crate::canvas::{render_scaled, CanvasSize, StrokePath};
use crate::error::PipelineError;

/// Everything produced by one successful classification
#[derive(Debug, Clone)]
pub struct Classification {
    /// Predicted digit
    pub label: Label,
    /// Top class probability, if reported
    pub confidence: Option<f32>,
    /// Resized grayscale preview
    pub resized: GrayImage,
    /// Remapped tensor preview
    pub tensor: DigitTensor,
    /// Remap policy that produced `tensor`
    pub remap: RemapMode,
    /// Wall time of render + preprocess + inference
    pub processing_time_ms: u64,
}

/// Run render, preprocess and classify for one finished stroke
pub fn run_pipeline(
    path: &StrokePath,
    canvas: CanvasSize,
    scale: f32,
    config: &PreprocessConfig,
    model: &mut dyn DigitModel,
) -> Result<Classification, PipelineError> {
    let start = Instant::now();

    let bitmap = render_scaled(path, canvas, scale)?;
    let Preprocessed { resized, tensor } = preprocess_with_preview(&bitmap, config)?;
    let Classified { label, confidence } = classify(model, &tensor)?;

    let processing_time = start.elapsed();
    debug!("Pipeline complete in {:?}: {}", processing_time, label);

    Ok(Classification {
        label,
        confidence,
        resized,
        tensor,
        remap: config.remap,
        processing_time_ms: processing_time.as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Point;
    use crate::error::{InferenceError, RenderError};

    /// Records the last tensor it saw and answers with a fixed class
    struct RecordingModel {
        class: usize,
        seen: Option<DigitTensor>,
    }

    impl DigitModel for RecordingModel {
        fn predict(&mut self, tensor: &DigitTensor) -> Result<Prediction, InferenceError> {
            self.seen = Some(tensor.clone());
            Ok(Prediction {
                class: self.class,
                confidence: None,
            })
        }
    }

    #[test]
    fn test_pipeline_passes_tensor_to_model() {
        let mut model = RecordingModel { class: 3, seen: None };
        let path = StrokePath::from_points(vec![Point::new(150.0, 150.0)]);

        let result = run_pipeline(
            &path,
            CanvasSize::new(300, 300),
            1.0,
            &PreprocessConfig::default(),
            &mut model,
        )
        .unwrap();

        assert_eq!(result.label.as_str(), "3");
        assert_eq!(model.seen.as_ref(), Some(&result.tensor));
        assert_eq!(result.resized.dimensions(), (TENSOR_SIDE, TENSOR_SIDE));
        assert!(result.tensor.get(14, 14) > 0);
        assert_eq!(result.tensor.get(0, 0), 0);
    }

    #[test]
    fn test_pipeline_stops_at_render_failure() {
        let mut model = RecordingModel { class: 3, seen: None };
        let path = StrokePath::from_points(vec![Point::new(1.0, 1.0)]);

        let err = run_pipeline(
            &path,
            CanvasSize::new(0, 300),
            1.0,
            &PreprocessConfig::default(),
            &mut model,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Render(RenderError::EmptyCanvas { .. })));
        assert!(model.seen.is_none());
    }

    #[test]
    fn test_pipeline_surfaces_inference_failure() {
        let mut model = UnavailableModel::new("not loaded");
        let path = StrokePath::from_points(vec![Point::new(10.0, 10.0)]);

        let err = run_pipeline(
            &path,
            CanvasSize::new(100, 100),
            1.0,
            &PreprocessConfig::default(),
            &mut model,
        )
        .unwrap_err();

        assert_eq!(err.stage(), "inference");
    }
}
