//! Live page capability
//!
//! The capture pipeline never touches a DOM directly. Everything it reads or
//! mutates on the host page goes through [`PageStateHandle`], so the state
//! the driver borrows for a run (scroll offsets, inline visibility, the
//! tool's own overlay) is visible in its interface and can be restored.

mod chrome;
mod resolver;
pub mod synthetic;

pub use chrome::FixedChromeSet;
pub use resolver::{ResolvedBy, ScrollTargetResolver};

use crate::domain::ElementId;

/// What kind of document is loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    /// A rendered binary document (e.g. a PDF viewer) with no inner DOM scroller
    Binary { content_type: String },
}

/// Computed `overflow-y`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Clip,
    Auto,
    Scroll,
}

/// Computed `position`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

/// Whole-document measurements in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentMetrics {
    pub scroll_height: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub device_pixel_ratio: f64,
    pub root_overflow_y: Overflow,
    pub body_overflow_y: Overflow,
}

/// Layout facts about one element, as seen by a page-wide scan
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInfo {
    pub id: ElementId,
    pub position: Position,
    pub overflow_y: Overflow,
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub opacity: f32,
    pub scroll_height: f64,
    pub client_height: f64,
    /// Rendered bounding box size
    pub rect_width: f64,
    pub rect_height: f64,
}

impl ElementInfo {
    pub fn area(&self) -> f64 {
        self.rect_width * self.rect_height
    }

    pub fn is_rendered(&self) -> bool {
        !self.display_none && !self.visibility_hidden && self.opacity > 0.0
    }
}

/// Scroll state saved before a run and put back afterwards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSnapshot {
    pub container: Option<ElementId>,
    pub offset: f64,
}

/// Read and mutate the parts of the live page the capture run owns
///
/// `None` as a container always means the document/window scroller.
pub trait PageStateHandle {
    fn document_kind(&self) -> DocumentKind;

    fn document_metrics(&self) -> DocumentMetrics;

    /// Page-wide element scan
    fn elements(&self) -> Vec<ElementInfo>;

    /// Current scroll offset of the scroller
    fn scroll_offset(&self, container: Option<ElementId>) -> f64;

    /// Current full content height of the scroller (may differ from the
    /// estimate taken when the target was resolved)
    fn scroll_height(&self, container: Option<ElementId>) -> f64;

    /// Request a scroll; the page clamps it to its real range
    fn scroll_to(&mut self, container: Option<ElementId>, offset: f64);

    /// Inline `visibility` style (not the computed one)
    fn inline_visibility(&self, element: ElementId) -> Option<String>;

    fn set_inline_visibility(&mut self, element: ElementId, value: Option<&str>);

    /// Hide or show in-page UI that belongs to this tool
    fn set_tool_overlay_hidden(&mut self, hidden: bool);

    /// Raw bytes of a binary document, if the page exposes them
    fn document_bytes(&self) -> Option<Vec<u8>> {
        None
    }

    fn save(&self, container: Option<ElementId>) -> PageSnapshot {
        PageSnapshot {
            container,
            offset: self.scroll_offset(container),
        }
    }

    fn restore(&mut self, snapshot: &PageSnapshot) {
        self.scroll_to(snapshot.container, snapshot.offset);
    }
}
