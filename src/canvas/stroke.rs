//! Freehand stroke recording
//!
//! Turns pointer-down/drag/up events into an ordered point sequence.

/// A point in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale both coordinates by the same factor
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// An ordered sequence of points joined by straight segments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrokePath {
    points: Vec<Point>,
}

impl StrokePath {
    /// Create a path from a list of points
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Consecutive point pairs.
    ///
    /// A single-point path yields one zero-length segment so a tap still
    /// leaves a dot on the canvas.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let dot = match self.points.as_slice() {
            [only] => Some((*only, *only)),
            _ => None,
        };
        dot.into_iter()
            .chain(self.points.windows(2).map(|pair| (pair[0], pair[1])))
    }
}

/// Accumulates pointer events into the current stroke
#[derive(Debug, Default)]
pub struct StrokeRecorder {
    path: StrokePath,
    /// True between `begin` and `end`
    active: bool,
}

impl StrokeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new stroke, discarding any previous one
    pub fn begin(&mut self, point: Point) {
        self.path.points.clear();
        self.path.points.push(point);
        self.active = true;
    }

    /// Append a point to the current stroke.
    ///
    /// Without an open stroke this behaves like `begin`.
    pub fn extend(&mut self, point: Point) {
        if !self.active || self.path.is_empty() {
            self.begin(point);
            return;
        }
        if self.path.points.last() == Some(&point) {
            return;
        }
        self.path.points.push(point);
    }

    /// Finish the current stroke and return a snapshot of it
    pub fn end(&mut self) -> Option<StrokePath> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some(self.path.clone())
    }

    /// The current (or last finished) stroke
    pub fn path(&self) -> &StrokePath {
        &self.path
    }

    /// Whether a stroke is being drawn right now
    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_resets_path() {
        let mut recorder = StrokeRecorder::new();
        recorder.begin(Point::new(1.0, 1.0));
        recorder.extend(Point::new(2.0, 2.0));
        recorder.end();

        recorder.begin(Point::new(5.0, 5.0));
        assert_eq!(recorder.path().points(), &[Point::new(5.0, 5.0)]);
    }

    #[test]
    fn test_extend_appends_in_order() {
        let mut recorder = StrokeRecorder::new();
        recorder.begin(Point::new(0.0, 0.0));
        recorder.extend(Point::new(1.0, 0.0));
        recorder.extend(Point::new(1.0, 1.0));

        let path = recorder.end().unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.points()[2], Point::new(1.0, 1.0));
    }

    #[test]
    fn test_extend_without_begin_starts_stroke() {
        let mut recorder = StrokeRecorder::new();
        recorder.extend(Point::new(3.0, 4.0));

        assert!(recorder.is_active());
        assert_eq!(recorder.path().points(), &[Point::new(3.0, 4.0)]);
    }

    #[test]
    fn test_extend_skips_repeated_point() {
        let mut recorder = StrokeRecorder::new();
        recorder.begin(Point::new(0.0, 0.0));
        recorder.extend(Point::new(0.0, 0.0));
        assert_eq!(recorder.path().len(), 1);
    }

    #[test]
    fn test_end_without_stroke() {
        let mut recorder = StrokeRecorder::new();
        assert!(recorder.end().is_none());

        recorder.begin(Point::new(0.0, 0.0));
        assert!(recorder.end().is_some());
        // Second end is a no-op
        assert!(recorder.end().is_none());
    }

    #[test]
    fn test_segments() {
        let dot = StrokePath::from_points(vec![Point::new(2.0, 2.0)]);
        let segments: Vec<_> = dot.segments().collect();
        assert_eq!(segments, vec![(Point::new(2.0, 2.0), Point::new(2.0, 2.0))]);

        let line = StrokePath::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
        ]);
        assert_eq!(line.segments().count(), 2);

        assert_eq!(StrokePath::default().segments().count(), 0);
    }
}
