//! Drawing Layer
//!
//! Records freehand strokes and rasterizes them into bitmaps that the
//! vision pipeline can consume.

pub mod raster;
pub mod stroke;

pub use raster::{render, render_scaled, Bitmap, STROKE_WIDTH};
pub use stroke::{Point, StrokePath, StrokeRecorder};

use serde::{Deserialize, Serialize};

/// Pointer events emitted by the drawing surface, in local canvas units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SketchEvent {
    /// Pointer pressed: start a new stroke
    Down(Point),
    /// Pointer moved while pressed
    Drag(Point),
    /// Pointer released: the stroke is complete
    Up,
}

/// Size of the drawing surface in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build from a UI-reported size, rounding to whole units
    pub fn from_f32(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0).round() as u32,
            height: height.max(0.0).round() as u32,
        }
    }

    /// True if the canvas has no drawable area
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
        }
    }
}
