//! Error types for the draw-to-label pipeline
//!
//! Each stage has its own error so the controller can log where a
//! classification attempt failed.

use thiserror::Error;

/// Rasterization failed
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("canvas has zero area ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("invalid pixel scale {0}")]
    InvalidScale(f32),
    #[error("bitmap of {width}x{height} pixels exceeds the {max} pixel limit per side")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Bitmap could not be turned into a model tensor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("source bitmap is empty ({width}x{height})")]
    EmptyBitmap { width: u32, height: u32 },
    #[error("pixel buffer of {actual} bytes does not match {width}x{height}")]
    BufferSize { width: u32, height: u32, actual: usize },
}

/// The external model failed or rejected its input
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("model input shape {shape:?} does not hold {expected} values")]
    ShapeMismatch { shape: Vec<i64>, expected: usize },
    #[error("model produced {0} scores, expected 10")]
    UnexpectedOutput(usize),
    #[error("class index {0} is not a digit")]
    InvalidClass(usize),
    #[error("inference runtime error: {0}")]
    Runtime(String),
}

impl From<ort::Error> for InferenceError {
    fn from(err: ort::Error) -> Self {
        InferenceError::Runtime(err.to_string())
    }
}

/// Any failure between a finished stroke and a label
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
}

impl PipelineError {
    /// Short name of the failing stage, used in logs
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Render(_) => "render",
            PipelineError::Conversion(_) => "conversion",
            PipelineError::Inference(_) => "inference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_from_stage_errors() {
        let err: PipelineError = RenderError::EmptyCanvas { width: 0, height: 300 }.into();
        assert_eq!(err.stage(), "render");
        assert!(err.to_string().contains("0x300"));

        let err: PipelineError = ConversionError::EmptyBitmap { width: 0, height: 0 }.into();
        assert_eq!(err.stage(), "conversion");

        let err: PipelineError = InferenceError::Unavailable("no model".into()).into();
        assert_eq!(err.stage(), "inference");
        assert!(err.to_string().contains("no model"));
    }
}
