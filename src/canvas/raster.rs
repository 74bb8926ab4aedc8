//! Stroke rasterization
//!
//! Renders a [`StrokePath`] onto a white RGB bitmap with a fixed-width black
//! pen. Segments are filled quads capped with discs, so joins and endpoints
//! come out round. No anti-aliasing.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;
use tracing::debug;

use super::stroke::{Point, StrokePath};
use super::CanvasSize;
use crate::error::RenderError;

/// Pen width in canvas units
pub const STROKE_WIDTH: f32 = 15.0;

/// Largest bitmap side we are willing to allocate
pub const MAX_DIMENSION: u32 = 8192;

/// Rendered canvas snapshot
pub type Bitmap = RgbImage;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Render a path at one pixel per canvas unit
pub fn render(path: &StrokePath, canvas: CanvasSize) -> Result<Bitmap, RenderError> {
    render_scaled(path, canvas, 1.0)
}

/// Render a path into a bitmap of `canvas * scale` pixels.
///
/// Point coordinates and the pen width are scaled together, so the stroke
/// covers the same fraction of the canvas at any resolution.
pub fn render_scaled(path: &StrokePath, canvas: CanvasSize, scale: f32) -> Result<Bitmap, RenderError> {
    if canvas.is_empty() {
        return Err(RenderError::EmptyCanvas {
            width: canvas.width,
            height: canvas.height,
        });
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RenderError::InvalidScale(scale));
    }

    let width = (canvas.width as f32 * scale).round() as u32;
    let height = (canvas.height as f32 * scale).round() as u32;
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyCanvas { width, height });
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RenderError::TooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }

    let mut bitmap = RgbImage::from_pixel(width, height, BACKGROUND);
    let pen = STROKE_WIDTH * scale;

    for (from, to) in path.segments() {
        stroke_segment(&mut bitmap, from.scaled(scale), to.scaled(scale), pen);
    }

    debug!(
        "Rendered {} points onto {}x{} bitmap (scale {})",
        path.len(),
        width,
        height,
        scale
    );

    Ok(bitmap)
}

/// Draw one pen segment with round caps
fn stroke_segment(bitmap: &mut RgbImage, from: Point, to: Point, pen: f32) {
    let half = pen / 2.0;
    let radius = half.floor().max(0.0) as i32;

    draw_filled_circle_mut(bitmap, to_pixel(from), radius, INK);
    if from == to {
        return;
    }
    draw_filled_circle_mut(bitmap, to_pixel(to), radius, INK);

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 0.5 {
        return;
    }

    // Unit normal scaled to half the pen width
    let nx = -dy / len * half;
    let ny = dx / len * half;

    let quad = [
        pixel_point(from.x + nx, from.y + ny),
        pixel_point(to.x + nx, to.y + ny),
        pixel_point(to.x - nx, to.y - ny),
        pixel_point(from.x - nx, from.y - ny),
    ];

    // draw_polygon_mut rejects closed polygons
    if quad[0] == quad[3] {
        return;
    }
    draw_polygon_mut(bitmap, &quad, INK);
}

fn to_pixel(point: Point) -> (i32, i32) {
    (point.x.round() as i32, point.y.round() as i32)
}

fn pixel_point(x: f32, y: f32) -> PixelPoint<i32> {
    PixelPoint::new(x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_ink(bitmap: &Bitmap, x: u32, y: u32) -> bool {
        bitmap.get_pixel(x, y) == &INK
    }

    #[test]
    fn test_empty_path_is_all_white() {
        let bitmap = render(&StrokePath::default(), CanvasSize::new(64, 48)).unwrap();
        assert_eq!(bitmap.dimensions(), (64, 48));
        assert!(bitmap.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_zero_area_canvas_fails() {
        let path = StrokePath::from_points(vec![Point::new(1.0, 1.0)]);

        let err = render(&path, CanvasSize::new(0, 300)).unwrap_err();
        assert_eq!(err, RenderError::EmptyCanvas { width: 0, height: 300 });

        assert!(render(&path, CanvasSize::new(300, 0)).is_err());
    }

    #[test]
    fn test_invalid_scale_fails() {
        let path = StrokePath::default();
        let canvas = CanvasSize::new(10, 10);
        assert!(matches!(render_scaled(&path, canvas, 0.0), Err(RenderError::InvalidScale(_))));
        assert!(matches!(render_scaled(&path, canvas, f32::NAN), Err(RenderError::InvalidScale(_))));
    }

    #[test]
    fn test_oversized_canvas_fails() {
        let err = render(&StrokePath::default(), CanvasSize::new(MAX_DIMENSION + 1, 10)).unwrap_err();
        assert!(matches!(err, RenderError::TooLarge { .. }));
    }

    #[test]
    fn test_single_point_draws_dot() {
        let path = StrokePath::from_points(vec![Point::new(150.0, 150.0)]);
        let bitmap = render(&path, CanvasSize::new(300, 300)).unwrap();

        assert!(is_ink(&bitmap, 150, 150));
        assert!(is_ink(&bitmap, 144, 150));
        assert!(is_ink(&bitmap, 150, 156));
        // Outside the 15 unit pen
        assert!(!is_ink(&bitmap, 140, 150));
        assert!(!is_ink(&bitmap, 150, 160));
        assert!(!is_ink(&bitmap, 0, 0));
    }

    #[test]
    fn test_segment_covers_pen_width() {
        let path = StrokePath::from_points(vec![Point::new(20.0, 50.0), Point::new(80.0, 50.0)]);
        let bitmap = render(&path, CanvasSize::new(100, 100)).unwrap();

        for x in 20..=80 {
            assert!(is_ink(&bitmap, x, 50), "gap at x={}", x);
            assert!(is_ink(&bitmap, x, 44), "thin stroke at x={}", x);
            assert!(is_ink(&bitmap, x, 56), "thin stroke at x={}", x);
            assert!(!is_ink(&bitmap, x, 40));
            assert!(!is_ink(&bitmap, x, 60));
        }
    }

    #[test]
    fn test_scaled_render_keeps_proportions() {
        let path = StrokePath::from_points(vec![Point::new(50.0, 50.0)]);
        let canvas = CanvasSize::new(100, 100);

        let bitmap = render_scaled(&path, canvas, 2.0).unwrap();
        assert_eq!(bitmap.dimensions(), (200, 200));
        assert!(is_ink(&bitmap, 100, 100));
        // Pen doubled to 30 pixels
        assert!(is_ink(&bitmap, 100, 88));
        assert!(!is_ink(&bitmap, 100, 80));
    }
}
