use skrifa::outline::OutlinePen;
use tiny_skia::{Path, PathBuilder};

/// Collects a glyph outline as a tiny-skia path.
///
/// Font space is y-up and pixmaps are y-down, so every y is negated; the
/// caller translates the finished path into the canvas.
pub(crate) struct PathPen {
    builder: PathBuilder,
}

impl PathPen {
    pub(crate) fn new() -> Self {
        Self {
            builder: PathBuilder::new(),
        }
    }

    /// `None` when the outline had no drawable contours
    pub(crate) fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlinePen for PathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, -y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, -y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.builder.quad_to(cx0, -cy0, x, -y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.builder.cubic_to(cx0, -cy0, cx1, -cy1, x, -y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
