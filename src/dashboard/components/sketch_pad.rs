//! Freehand drawing surface
//!
//! Paints the current stroke and turns pointer presses, drags and releases
//! into [`SketchEvent`]s in local canvas coordinates.

use egui::{Pos2, Rect, RichText, Rounding, Sense, Shape, Stroke, Vec2};

use crate::canvas::{Point, SketchEvent, StrokePath, STROKE_WIDTH};
use crate::dashboard::theme::ThemeColors;

/// Drawing surface widget state
#[derive(Debug, Default)]
pub struct SketchPad {
    /// Pointer is held down on the pad
    pressed: bool,
    /// Last reported position, to skip duplicate drags
    last: Option<Point>,
}

impl SketchPad {
    /// Draw the pad and collect this frame's pointer events.
    ///
    /// Returns the events and the rect the pad occupies.
    pub fn show(&mut self, ui: &mut egui::Ui, size: Vec2, path: &StrokePath) -> (Vec<SketchEvent>, Rect) {
        let (response, painter) = ui.allocate_painter(size, Sense::drag());
        let rect = response.rect;

        painter.rect_filled(rect, Rounding::same(4.0), ThemeColors::PAPER);

        let mut events = Vec::new();
        if response.is_pointer_button_down_on() {
            if let Some(pos) = response.interact_pointer_pos() {
                let point = to_canvas(pos, rect);
                if !self.pressed {
                    self.pressed = true;
                    events.push(SketchEvent::Down(point));
                } else if self.last != Some(point) {
                    events.push(SketchEvent::Drag(point));
                }
                self.last = Some(point);
            }
        } else if self.pressed {
            self.pressed = false;
            self.last = None;
            events.push(SketchEvent::Up);
        }

        if path.is_empty() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Draw a digit",
                egui::FontId::proportional(18.0),
                ThemeColors::TEXT_SECONDARY,
            );
        } else {
            paint_path(&painter, rect, path);
        }

        (events, rect)
    }
}

/// Map a screen position into canvas units, clamped to the pad
fn to_canvas(pos: Pos2, rect: Rect) -> Point {
    let local = pos - rect.min;
    Point::new(
        local.x.clamp(0.0, rect.width()),
        local.y.clamp(0.0, rect.height()),
    )
}

fn paint_path(painter: &egui::Painter, rect: Rect, path: &StrokePath) {
    let screen: Vec<Pos2> = path
        .points()
        .iter()
        .map(|p| rect.min + Vec2::new(p.x, p.y))
        .collect();

    // Discs at every vertex give round joins like the rasterizer
    for &pos in &screen {
        painter.circle_filled(pos, STROKE_WIDTH / 2.0, ThemeColors::INK);
    }
    if screen.len() > 1 {
        painter.add(Shape::line(screen, Stroke::new(STROKE_WIDTH, ThemeColors::INK)));
    }
}

/// Caption under the pad
pub fn pad_caption(ui: &mut egui::Ui, text: &str) {
    ui.label(RichText::new(text).size(12.0).color(ThemeColors::TEXT_MUTED));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_canvas_is_local_and_clamped() {
        let rect = Rect::from_min_size(Pos2::new(100.0, 50.0), Vec2::new(300.0, 300.0));

        assert_eq!(to_canvas(Pos2::new(250.0, 200.0), rect), Point::new(150.0, 150.0));
        assert_eq!(to_canvas(Pos2::new(90.0, 400.0), rect), Point::new(0.0, 300.0));
    }
}
