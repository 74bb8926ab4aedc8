//! Digit classification
//!
//! The model itself is an external collaborator behind [`DigitModel`]. This
//! module turns its raw prediction into a display label.

use std::fmt;

use tracing::{debug, warn};

use super::preprocess::DigitTensor;
use crate::error::InferenceError;

/// Text shown when any pipeline stage fails
pub const ERROR_LABEL: &str = "Error";

/// Predicted digit in display form ("0" to "9")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    /// Label for a class index, rejecting anything outside 0-9
    pub fn from_class(class: usize) -> Result<Self, InferenceError> {
        if class > 9 {
            return Err(InferenceError::InvalidClass(class));
        }
        Ok(Self(class.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw model output
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Index of the top class
    pub class: usize,
    /// Probability of the top class, if the model reports one
    pub confidence: Option<f32>,
}

/// A pre-trained digit classifier
pub trait DigitModel: Send {
    /// Run one inference on a 28x28 tensor
    fn predict(&mut self, tensor: &DigitTensor) -> Result<Prediction, InferenceError>;

    /// Name for logs and the status line
    fn name(&self) -> &str {
        "model"
    }
}

/// Classification outcome handed to the display
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub label: Label,
    pub confidence: Option<f32>,
}

/// Run the model once and convert its answer into a label
pub fn classify(model: &mut dyn DigitModel, tensor: &DigitTensor) -> Result<Classified, InferenceError> {
    let prediction = model.predict(tensor)?;
    let label = Label::from_class(prediction.class)?;

    debug!(
        "{} predicted {} (confidence {:?})",
        model.name(),
        label,
        prediction.confidence
    );

    Ok(Classified {
        label,
        confidence: prediction.confidence,
    })
}

/// Stand-in used when the real model could not be loaded
pub struct UnavailableModel {
    reason: String,
}

impl UnavailableModel {
    pub fn new(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("Digit model unavailable: {}", reason);
        Self { reason }
    }
}

impl DigitModel for UnavailableModel {
    fn predict(&mut self, _tensor: &DigitTensor) -> Result<Prediction, InferenceError> {
        Err(InferenceError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Index and softmax probability of the largest score
pub fn top_class(scores: &[f32]) -> Option<(usize, f32)> {
    let (best, &max) = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .max_by(|a, b| a.1.total_cmp(b.1))?;

    let sum: f32 = scores
        .iter()
        .filter(|s| s.is_finite())
        .map(|s| (s - max).exp())
        .sum();

    Some((best, 1.0 / sum))
}
