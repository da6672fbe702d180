//! Rectangle selection drag state
//!
//! Coordinates here are native pixels. Handles are hit-tested corners
//! first, then edges, then the interior; anything else starts a new rect.

use crate::domain::{DragMode, Point, Rect, SelectionOutcome, SelectionRect};

#[derive(Debug, Clone, Copy)]
struct Drag {
    mode: DragMode,
    /// Pointer offset from the rect's top-left corner when a move started
    grab: (i32, i32),
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    rect: Option<Rect>,
    drag: Option<Drag>,
    bounds: (i32, i32),
    min_size: u32,
}

impl SelectionState {
    pub fn new(width: u32, height: u32, min_size: u32) -> Self {
        Self {
            rect: None,
            drag: None,
            bounds: (width as i32, height as i32),
            min_size,
        }
    }

    /// The current rectangle, normalized
    pub fn rect(&self) -> Option<SelectionRect> {
        self.rect.map(|r| r.normalized().to_selection())
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|d| d.mode)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn clear(&mut self) {
        self.rect = None;
        self.drag = None;
    }

    fn clamp(&self, p: Point) -> (i32, i32) {
        (
            (p.x.round() as i32).clamp(0, self.bounds.0),
            (p.y.round() as i32).clamp(0, self.bounds.1),
        )
    }

    /// Which handle of `rect` is under `(x, y)`, if any
    fn handle_at(rect: &Rect, x: i32, y: i32, tolerance: i32) -> Option<DragMode> {
        let near = |a: i32, b: i32| (a - b).abs() <= tolerance;
        let within_x = x >= rect.left && x <= rect.right;
        let within_y = y >= rect.top && y <= rect.bottom;

        if near(x, rect.left) && near(y, rect.top) {
            return Some(DragMode::ResizeNW);
        }
        if near(x, rect.right) && near(y, rect.top) {
            return Some(DragMode::ResizeNE);
        }
        if near(x, rect.left) && near(y, rect.bottom) {
            return Some(DragMode::ResizeSW);
        }
        if near(x, rect.right) && near(y, rect.bottom) {
            return Some(DragMode::ResizeSE);
        }
        if near(y, rect.top) && within_x {
            return Some(DragMode::ResizeN);
        }
        if near(y, rect.bottom) && within_x {
            return Some(DragMode::ResizeS);
        }
        if near(x, rect.left) && within_y {
            return Some(DragMode::ResizeW);
        }
        if near(x, rect.right) && within_y {
            return Some(DragMode::ResizeE);
        }
        None
    }

    /// Pointer down; `tolerance` is the handle grab distance in native pixels
    pub fn begin(&mut self, p: Point, tolerance: f32) -> DragMode {
        let (x, y) = self.clamp(p);
        let tolerance = tolerance.round().max(1.0) as i32;

        if let Some(rect) = self.rect.map(Rect::normalized) {
            if let Some(mode) = Self::handle_at(&rect, x, y, tolerance) {
                self.rect = Some(rect);
                self.drag = Some(Drag { mode, grab: (0, 0) });
                return mode;
            }
            if rect.contains_point(x, y) {
                self.rect = Some(rect);
                self.drag = Some(Drag {
                    mode: DragMode::Move,
                    grab: (x - rect.left, y - rect.top),
                });
                return DragMode::Move;
            }
        }

        self.rect = Some(Rect::new(x, y, x, y));
        self.drag = Some(Drag {
            mode: DragMode::Create,
            grab: (0, 0),
        });
        DragMode::Create
    }

    /// Pointer moved while dragging
    pub fn update(&mut self, p: Point) {
        let (Some(mut drag), Some(mut rect)) = (self.drag, self.rect) else {
            return;
        };
        let (x, y) = self.clamp(p);

        match drag.mode {
            DragMode::Create => {
                rect.right = x;
                rect.bottom = y;
            }
            DragMode::Move => {
                let (w, h) = (rect.width(), rect.height());
                let left = (x - drag.grab.0).clamp(0, (self.bounds.0 - w).max(0));
                let top = (y - drag.grab.1).clamp(0, (self.bounds.1 - h).max(0));
                rect = Rect::new(left, top, left + w, top + h);
            }
            mode => {
                if mode.moves_left() {
                    rect.left = x;
                }
                if mode.moves_right() {
                    rect.right = x;
                }
                if mode.moves_top() {
                    rect.top = y;
                }
                if mode.moves_bottom() {
                    rect.bottom = y;
                }
                // Dragged edge crossed the opposite one: keep the rect
                // normalized and continue with the mirrored handle
                if rect.left > rect.right {
                    std::mem::swap(&mut rect.left, &mut rect.right);
                    drag.mode = drag.mode.flip_horizontal();
                }
                if rect.top > rect.bottom {
                    std::mem::swap(&mut rect.top, &mut rect.bottom);
                    drag.mode = drag.mode.flip_vertical();
                }
            }
        }

        self.rect = Some(rect);
        self.drag = Some(drag);
    }

    /// Pointer up: normalize, or discard a rect below the minimum size
    pub fn end(&mut self) -> SelectionOutcome {
        if self.drag.take().is_none() {
            return SelectionOutcome::Idle;
        }
        let Some(rect) = self.rect.map(Rect::normalized) else {
            return SelectionOutcome::Idle;
        };
        let selection = rect.to_selection();
        if selection.is_below(self.min_size) {
            log::debug!("Discarding selection {}", selection.size_label());
            self.rect = None;
            return SelectionOutcome::TooSmall;
        }
        self.rect = Some(rect);
        SelectionOutcome::Committed(selection)
    }
}
