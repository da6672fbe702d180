//! Selection drag modes and editor tools

/// What a pointer drag on the selection is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Drawing a new rectangle from an anchor point
    Create,
    /// Translating the existing rectangle
    Move,
    ResizeN,
    ResizeS,
    ResizeE,
    ResizeW,
    ResizeNE,
    ResizeNW,
    ResizeSE,
    ResizeSW,
}

impl DragMode {
    /// Whether this drag moves the left/right edge
    pub fn moves_left(self) -> bool {
        matches!(self, DragMode::ResizeW | DragMode::ResizeNW | DragMode::ResizeSW)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, DragMode::ResizeE | DragMode::ResizeNE | DragMode::ResizeSE)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, DragMode::ResizeN | DragMode::ResizeNE | DragMode::ResizeNW)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, DragMode::ResizeS | DragMode::ResizeSE | DragMode::ResizeSW)
    }

    /// Mirror the horizontal component (E <-> W), used when the dragged
    /// edge crosses the opposite one
    pub fn flip_horizontal(self) -> Self {
        match self {
            DragMode::ResizeE => DragMode::ResizeW,
            DragMode::ResizeW => DragMode::ResizeE,
            DragMode::ResizeNE => DragMode::ResizeNW,
            DragMode::ResizeNW => DragMode::ResizeNE,
            DragMode::ResizeSE => DragMode::ResizeSW,
            DragMode::ResizeSW => DragMode::ResizeSE,
            other => other,
        }
    }

    /// Mirror the vertical component (N <-> S)
    pub fn flip_vertical(self) -> Self {
        match self {
            DragMode::ResizeN => DragMode::ResizeS,
            DragMode::ResizeS => DragMode::ResizeN,
            DragMode::ResizeNE => DragMode::ResizeSE,
            DragMode::ResizeSE => DragMode::ResizeNE,
            DragMode::ResizeNW => DragMode::ResizeSW,
            DragMode::ResizeSW => DragMode::ResizeNW,
            other => other,
        }
    }
}

/// Active editor tool
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    #[default]
    None,
    Pen,
    Select,
}

/// Result of finishing a selection drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The rectangle was normalized and kept
    Committed(super::SelectionRect),
    /// The rectangle was below the minimum size and has been discarded
    TooSmall,
    /// No drag was in progress
    Idle,
}
