//! Display state owned by the UI thread

use image::GrayImage;

use crate::error::PipelineError;
use crate::vision::{Classification, RemapMode, ERROR_LABEL};

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing drawn yet
    #[default]
    Idle,
    /// Pointer is down and the stroke is growing
    Drawing,
    /// Stroke finished, waiting for the worker
    Classifying,
    /// A label (or "Error") is on screen
    Displaying,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Drawing => "Drawing",
            Phase::Classifying => "Classifying",
            Phase::Displaying => "Displaying",
        }
    }
}

/// Preview images shown next to the canvas
#[derive(Debug, Clone)]
pub struct Previews {
    /// Canvas stretched to 28x28, grayscale
    pub resized: GrayImage,
    /// Remapped model input
    pub remapped: GrayImage,
    /// Policy applied to `remapped`
    pub remap: RemapMode,
}

impl Previews {
    /// Caption for the remapped image
    pub fn remapped_title(&self) -> &'static str {
        match self.remap {
            RemapMode::Invert => "Inverted",
            RemapMode::Threshold => "Thresholded",
        }
    }
}

/// Result of the last classification attempt
#[derive(Debug, Clone, Default)]
pub struct DisplayResult {
    /// Predicted digit, "Error", or empty before the first attempt
    pub label: String,
    /// Top class probability
    pub confidence: Option<f32>,
    /// Intermediate images; cleared on failure
    pub previews: Option<Previews>,
    /// Failure description for the status line
    pub error: Option<String>,
    /// Pipeline time in milliseconds
    pub processing_time_ms: u64,
}

impl DisplayResult {
    /// Result of a successful classification
    pub fn success(classification: &Classification) -> Self {
        Self {
            label: classification.label.to_string(),
            confidence: classification.confidence,
            previews: Some(Previews {
                resized: classification.resized.clone(),
                remapped: classification.tensor.to_gray_image(),
                remap: classification.remap,
            }),
            error: None,
            processing_time_ms: classification.processing_time_ms,
        }
    }

    /// Error sentinel with cleared previews
    pub fn failure(error: &PipelineError) -> Self {
        Self::error_message(error.to_string())
    }

    /// Error sentinel for failures outside the pipeline stages
    pub fn error_message(message: impl Into<String>) -> Self {
        Self {
            label: ERROR_LABEL.to_string(),
            confidence: None,
            previews: None,
            error: Some(message.into()),
            processing_time_ms: 0,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything the UI renders besides the stroke itself
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    /// Current controller phase
    pub phase: Phase,
    /// Last classification result
    pub result: DisplayResult,
    /// Bumped on every new result so the UI can refresh textures
    pub generation: u64,
}

impl DisplayState {
    /// Replace the shown result in one assignment
    pub fn set_result(&mut self, result: DisplayResult) {
        self.result = result;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::vision::{DigitTensor, Label};

    fn classification(remap: RemapMode) -> Classification {
        Classification {
            label: Label::from_class(7).unwrap(),
            confidence: Some(0.9),
            resized: GrayImage::from_pixel(28, 28, image::Luma([255])),
            tensor: DigitTensor::filled(0),
            remap,
            processing_time_ms: 3,
        }
    }

    #[test]
    fn test_success_records_applied_remap() {
        let result = DisplayResult::success(&classification(RemapMode::Invert));
        let previews = result.previews.unwrap();
        assert_eq!(previews.remap, RemapMode::Invert);
        assert_eq!(previews.remapped_title(), "Inverted");

        let result = DisplayResult::success(&classification(RemapMode::Threshold));
        let previews = result.previews.unwrap();
        assert_eq!(previews.remap, RemapMode::Threshold);
        assert_eq!(previews.remapped_title(), "Thresholded");
        assert_eq!(result.label, "7");
    }

    #[test]
    fn test_failure_clears_previews() {
        let mut state = DisplayState::default();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.result.label.is_empty());

        let err = PipelineError::from(RenderError::EmptyCanvas { width: 0, height: 1 });
        state.set_result(DisplayResult::failure(&err));

        assert_eq!(state.result.label, "Error");
        assert!(state.result.previews.is_none());
        assert!(state.result.is_error());
        assert_eq!(state.generation, 1);
    }
}
