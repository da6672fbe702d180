//! Pen strokes drawn on the annotation overlay
//!
//! All stroke coordinates are stored in the composite's native pixel space.

use crate::config::PenColor;

/// A freehand stroke in progress or just finished
#[derive(Clone, Debug, PartialEq)]
pub struct PenStroke {
    /// Polyline vertices in native pixels
    pub points: Vec<(f32, f32)>,
    pub color: PenColor,
    /// Line width in native pixels
    pub width: f32,
}

impl PenStroke {
    pub fn new(start: (f32, f32), color: PenColor, width: f32) -> Self {
        Self {
            points: vec![start],
            color,
            width,
        }
    }

    /// Last vertex of the polyline
    pub fn last_point(&self) -> (f32, f32) {
        // `new` always seeds one point
        self.points.last().copied().unwrap_or_default()
    }
}
