//! Geometric types for selections and coordinates

/// A point in display or native pixel space (the caller decides which)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale both coordinates by per-axis factors
    pub fn scale(self, sx: f32, sy: f32) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
        }
    }
}

/// Edge-based rectangle in native pixels
///
/// While a drag is in progress `left > right` or `top > bottom` is allowed;
/// [`Rect::normalized`] swaps the edges back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Create a new rectangle from coordinates
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Swap inverted edges so that left <= right and top <= bottom
    pub fn normalized(self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left < right && top < bottom {
            Some(Rect {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Check if this rectangle contains a point (half-open on the far edges)
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Convert a normalized rect into an origin + size selection
    ///
    /// Whatever lies left of or above the origin is clipped off.
    pub fn to_selection(self) -> SelectionRect {
        let r = self.normalized();
        let left = r.left.max(0);
        let top = r.top.max(0);
        SelectionRect {
            x: left as u32,
            y: top as u32,
            width: (r.right - left).max(0) as u32,
            height: (r.bottom - top).max(0) as u32,
        }
    }
}

/// Committed selection in the composite's native pixel space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SelectionRect {
    /// Whether either side is below `min_size` native pixels
    pub fn is_below(&self, min_size: u32) -> bool {
        self.width < min_size || self.height < min_size
    }

    /// Size label shown next to the selection, e.g. `"490 × 290"`
    pub fn size_label(&self) -> String {
        format!("{} × {}", self.width, self.height)
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            self.x as i32,
            self.y as i32,
            (self.x + self.width) as i32,
            (self.y + self.height) as i32,
        )
    }
}
