//! Message types for communication between the UI thread and the
//! classification worker

use crate::canvas::{CanvasSize, StrokePath};
use crate::error::PipelineError;
use crate::vision::{Classification, PreprocessConfig};

/// Messages sent from the UI thread to the worker
#[derive(Debug, Clone)]
pub enum ToWorker {
    /// Classify a finished stroke
    Classify(ClassifyRequest),
    /// Replace the preprocessing configuration for later requests
    UpdateConfig(PreprocessConfig),
    /// Stop the worker loop
    Shutdown,
}

/// One finished stroke to classify
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    /// Monotonic request id, used to drop superseded outcomes
    pub id: u64,
    /// Snapshot of the stroke
    pub path: StrokePath,
    /// Drawing surface size in canvas units
    pub canvas: CanvasSize,
    /// Pixels per canvas unit
    pub scale: f32,
}

/// Result of one request, sent back to the UI thread
#[derive(Debug)]
pub struct ClassifyOutcome {
    /// Id of the request this answers
    pub id: u64,
    pub result: Result<Classification, PipelineError>,
}
