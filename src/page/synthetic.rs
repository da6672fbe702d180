//! In-memory page model
//!
//! Drives the pipeline without a browser: used by the tests and by the
//! `simulate` command. The model scrolls with real clamping, can grow or
//! shrink its content mid-run, carries fixed chrome with inline visibility
//! and renders each viewport as a deterministic bitmap where every content
//! row has a color derived from its absolute y position.

use std::cell::RefCell;
use std::rc::Rc;

use image::{Rgba, RgbaImage};

use crate::capture::CapturePrimitive;
use crate::domain::{Bitmap, CaptureError, ElementId};

use super::{
    DocumentKind, DocumentMetrics, ElementInfo, Overflow, PageStateHandle, Position,
};

/// Color of fixed chrome rows in rendered frames
pub const CHROME_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
/// Color of the tool's own overlay in rendered frames
pub const OVERLAY_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);
/// Window rows below a short inner scroller
pub const BACKGROUND_COLOR: Rgba<u8> = Rgba([200, 200, 200, 255]);

const OVERLAY_SIZE: u32 = 20;
const FIRST_FIXED_ID: u64 = 100;

#[derive(Debug, Clone)]
struct InnerScroller {
    width: f64,
    client_height: f64,
    scroll_height: f64,
    offset: f64,
    position: Position,
}

#[derive(Debug, Clone)]
struct FixedElement {
    id: ElementId,
    top: f64,
    height: f64,
    position: Position,
    visibility: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Growth {
    after_scrolls: usize,
    delta: f64,
}

#[derive(Debug)]
struct PageModel {
    kind: DocumentKind,
    document_bytes: Option<Vec<u8>>,
    viewport_width: f64,
    viewport_height: f64,
    device_pixel_ratio: f64,
    document_height: f64,
    document_offset: f64,
    root_overflow: Overflow,
    body_overflow: Overflow,
    inner: Option<InnerScroller>,
    fixed: Vec<FixedElement>,
    extra: Vec<ElementInfo>,
    overlay_hidden: bool,
    growth: Option<Growth>,
    scroll_shortfall: f64,
    scroll_count: usize,
    fail_capture_at: Option<usize>,
    encode_frames: bool,
    captures: usize,
    capture_times: Vec<tokio::time::Instant>,
    scroll_log: Vec<(f64, f64)>,
}

impl PageModel {
    fn max_offset(&self, container: Option<ElementId>) -> f64 {
        match (container, &self.inner) {
            (Some(SyntheticPage::INNER_SCROLLER), Some(inner)) => {
                (inner.scroll_height - inner.client_height).max(0.0)
            }
            _ => (self.document_height - self.viewport_height).max(0.0),
        }
    }

    fn offset(&self, container: Option<ElementId>) -> f64 {
        match (container, &self.inner) {
            (Some(SyntheticPage::INNER_SCROLLER), Some(inner)) => inner.offset,
            _ => self.document_offset,
        }
    }

    fn apply_growth(&mut self) {
        let Some(growth) = self.growth else {
            return;
        };
        if self.scroll_count != growth.after_scrolls {
            return;
        }
        log::debug!("Synthetic page content changes by {}px", growth.delta);
        match &mut self.inner {
            Some(inner) => inner.scroll_height = (inner.scroll_height + growth.delta).max(0.0),
            None => self.document_height = (self.document_height + growth.delta).max(0.0),
        }
    }

    fn render(&self) -> RgbaImage {
        let dpr = self.device_pixel_ratio;
        let width = (self.viewport_width * dpr).round() as u32;
        let height = (self.viewport_height * dpr).round() as u32;
        let mut img = RgbaImage::new(width, height);

        let (offset, content_rows) = match &self.inner {
            Some(inner) => (inner.offset, (inner.client_height * dpr).round() as u32),
            None => (self.document_offset, height),
        };
        let base = (offset * dpr).round() as u32;
        for (_, y, px) in img.enumerate_pixels_mut() {
            *px = if y < content_rows {
                SyntheticPage::content_color(base + y)
            } else {
                BACKGROUND_COLOR
            };
        }

        for el in &self.fixed {
            if el.visibility.as_deref() == Some("hidden") {
                continue;
            }
            let top = (el.top * dpr).round() as u32;
            let bottom = (((el.top + el.height) * dpr).round() as u32).min(height);
            for y in top..bottom {
                for x in 0..width {
                    img.put_pixel(x, y, CHROME_COLOR);
                }
            }
        }

        if !self.overlay_hidden {
            for y in 0..OVERLAY_SIZE.min(height) {
                for x in width.saturating_sub(OVERLAY_SIZE)..width {
                    img.put_pixel(x, y, OVERLAY_COLOR);
                }
            }
        }
        img
    }
}

/// Shared handle to an in-memory page; clones see the same page
#[derive(Debug, Clone)]
pub struct SyntheticPage {
    inner: Rc<RefCell<PageModel>>,
}

impl SyntheticPage {
    /// Id of the inner scroller created by [`SyntheticPage::inner_scroller`]
    pub const INNER_SCROLLER: ElementId = ElementId(1);

    /// A page whose document scrolls
    pub fn document(viewport_width: f64, viewport_height: f64, content_height: f64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PageModel {
                kind: DocumentKind::Html,
                document_bytes: None,
                viewport_width,
                viewport_height,
                device_pixel_ratio: 1.0,
                document_height: content_height,
                document_offset: 0.0,
                root_overflow: Overflow::Visible,
                body_overflow: Overflow::Visible,
                inner: None,
                fixed: Vec::new(),
                extra: Vec::new(),
                overlay_hidden: false,
                growth: None,
                scroll_shortfall: 0.0,
                scroll_count: 0,
                fail_capture_at: None,
                encode_frames: false,
                captures: 0,
                capture_times: Vec::new(),
                scroll_log: Vec::new(),
            })),
        }
    }

    /// A viewport-sized document whose content lives in an overflow:auto element
    pub fn inner_scroller(
        viewport_width: f64,
        viewport_height: f64,
        scroller_width: f64,
        scroller_client_height: f64,
        scroller_content_height: f64,
    ) -> Self {
        let page = Self::document(viewport_width, viewport_height, viewport_height);
        page.inner.borrow_mut().inner = Some(InnerScroller {
            width: scroller_width,
            client_height: scroller_client_height,
            scroll_height: scroller_content_height,
            offset: 0.0,
            position: Position::Relative,
        });
        page
    }

    /// Row color of content pixel row `y` (native pixels from the content top)
    pub fn content_color(y: u32) -> Rgba<u8> {
        Rgba([(y & 0xff) as u8, ((y >> 8) & 0xff) as u8, 0x80, 255])
    }

    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        self.inner.borrow_mut().device_pixel_ratio = ratio;
    }

    pub fn set_body_overflow(&self, overflow: Overflow) {
        self.inner.borrow_mut().body_overflow = overflow;
    }

    pub fn set_root_overflow(&self, overflow: Overflow) {
        self.inner.borrow_mut().root_overflow = overflow;
    }

    pub fn set_scroller_position(&self, position: Position) {
        if let Some(inner) = self.inner.borrow_mut().inner.as_mut() {
            inner.position = position;
        }
    }

    /// Turn the page into a non-HTML document with the given source bytes
    pub fn set_binary(&self, content_type: &str, bytes: Vec<u8>) {
        let mut model = self.inner.borrow_mut();
        model.kind = DocumentKind::Binary {
            content_type: content_type.to_string(),
        };
        model.document_bytes = Some(bytes);
    }

    /// Change the real content height of the active scroller immediately
    pub fn set_content_height(&self, height: f64) {
        let mut model = self.inner.borrow_mut();
        match &mut model.inner {
            Some(inner) => inner.scroll_height = height,
            None => model.document_height = height,
        }
    }

    /// Grow (or shrink, with a negative delta) the content after `after_scrolls` scrolls
    pub fn grow_after(&self, after_scrolls: usize, delta: f64) {
        self.inner.borrow_mut().growth = Some(Growth {
            after_scrolls,
            delta,
        });
    }

    /// Make every scroll land `px` short of the requested offset
    pub fn set_scroll_shortfall(&self, px: f64) {
        self.inner.borrow_mut().scroll_shortfall = px;
    }

    /// Make the `n`th capture (1-based) fail
    pub fn fail_capture_at(&self, n: usize) {
        self.inner.borrow_mut().fail_capture_at = Some(n);
    }

    /// Return frames as PNG bytes instead of decoded pixels
    pub fn encode_frames(&self, encode: bool) {
        self.inner.borrow_mut().encode_frames = encode;
    }

    pub fn add_element(&self, info: ElementInfo) {
        self.inner.borrow_mut().extra.push(info);
    }

    /// Add a fixed/sticky band at `top` (CSS px from the viewport top)
    pub fn add_fixed(
        &self,
        top: f64,
        height: f64,
        position: Position,
        visibility: Option<&str>,
    ) -> ElementId {
        let mut model = self.inner.borrow_mut();
        let id = ElementId(FIRST_FIXED_ID + model.fixed.len() as u64);
        model.fixed.push(FixedElement {
            id,
            top,
            height,
            position,
            visibility: visibility.map(str::to_string),
        });
        id
    }

    pub fn is_overlay_hidden(&self) -> bool {
        self.inner.borrow().overlay_hidden
    }

    pub fn capture_count(&self) -> usize {
        self.inner.borrow().captures
    }

    pub fn capture_times(&self) -> Vec<tokio::time::Instant> {
        self.inner.borrow().capture_times.clone()
    }

    /// Every `(requested, actual)` pair seen by `scroll_to`
    pub fn scroll_log(&self) -> Vec<(f64, f64)> {
        self.inner.borrow().scroll_log.clone()
    }

    /// Render the current viewport without counting it as a capture
    pub fn render(&self) -> RgbaImage {
        self.inner.borrow().render()
    }
}

impl PageStateHandle for SyntheticPage {
    fn document_kind(&self) -> DocumentKind {
        self.inner.borrow().kind.clone()
    }

    fn document_metrics(&self) -> DocumentMetrics {
        let model = self.inner.borrow();
        DocumentMetrics {
            scroll_height: model.document_height,
            viewport_width: model.viewport_width,
            viewport_height: model.viewport_height,
            device_pixel_ratio: model.device_pixel_ratio,
            root_overflow_y: model.root_overflow,
            body_overflow_y: model.body_overflow,
        }
    }

    fn elements(&self) -> Vec<ElementInfo> {
        let model = self.inner.borrow();
        let mut elements = Vec::new();
        if let Some(inner) = &model.inner {
            elements.push(ElementInfo {
                id: Self::INNER_SCROLLER,
                position: inner.position,
                overflow_y: Overflow::Auto,
                display_none: false,
                visibility_hidden: false,
                opacity: 1.0,
                scroll_height: inner.scroll_height,
                client_height: inner.client_height,
                rect_width: inner.width,
                rect_height: inner.client_height,
            });
        }
        elements.extend(model.fixed.iter().map(|el| ElementInfo {
            id: el.id,
            position: el.position,
            overflow_y: Overflow::Visible,
            display_none: false,
            visibility_hidden: el.visibility.as_deref() == Some("hidden"),
            opacity: 1.0,
            scroll_height: el.height,
            client_height: el.height,
            rect_width: model.viewport_width,
            rect_height: el.height,
        }));
        elements.extend(model.extra.iter().cloned());
        elements
    }

    fn scroll_offset(&self, container: Option<ElementId>) -> f64 {
        self.inner.borrow().offset(container)
    }

    fn scroll_height(&self, container: Option<ElementId>) -> f64 {
        let model = self.inner.borrow();
        match (container, &model.inner) {
            (Some(Self::INNER_SCROLLER), Some(inner)) => inner.scroll_height,
            _ => model.document_height,
        }
    }

    fn scroll_to(&mut self, container: Option<ElementId>, offset: f64) {
        let mut model = self.inner.borrow_mut();
        let clamped = (offset - model.scroll_shortfall).clamp(0.0, model.max_offset(container));
        match (container, &mut model.inner) {
            (Some(Self::INNER_SCROLLER), Some(inner)) => inner.offset = clamped,
            _ => model.document_offset = clamped,
        }
        model.scroll_log.push((offset, clamped));
        model.scroll_count += 1;
        model.apply_growth();
    }

    fn inline_visibility(&self, element: ElementId) -> Option<String> {
        self.inner
            .borrow()
            .fixed
            .iter()
            .find(|el| el.id == element)
            .and_then(|el| el.visibility.clone())
    }

    fn set_inline_visibility(&mut self, element: ElementId, value: Option<&str>) {
        let mut model = self.inner.borrow_mut();
        if let Some(el) = model.fixed.iter_mut().find(|el| el.id == element) {
            el.visibility = value.map(str::to_string);
        }
    }

    fn set_tool_overlay_hidden(&mut self, hidden: bool) {
        self.inner.borrow_mut().overlay_hidden = hidden;
    }

    fn document_bytes(&self) -> Option<Vec<u8>> {
        self.inner.borrow().document_bytes.clone()
    }
}

impl CapturePrimitive for SyntheticPage {
    async fn capture_visible_viewport(&mut self) -> Result<Bitmap, CaptureError> {
        let mut model = self.inner.borrow_mut();
        model.captures += 1;
        model.capture_times.push(tokio::time::Instant::now());
        if model.fail_capture_at == Some(model.captures) {
            return Err(CaptureError::CaptureUnavailable(
                "tab is no longer active".to_string(),
            ));
        }
        let frame = model.render();
        if model.encode_frames {
            let png = crate::output::encode_png(&frame)
                .map_err(|err| CaptureError::CaptureUnavailable(err.to_string()))?;
            return Ok(Bitmap::Encoded(png));
        }
        Ok(Bitmap::Rgba(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolling_is_clamped_to_the_real_range() {
        let mut page = SyntheticPage::document(800.0, 1000.0, 3200.0);
        page.scroll_to(None, 2500.0);
        assert_eq!(page.scroll_offset(None), 2200.0);
        page.scroll_to(None, -40.0);
        assert_eq!(page.scroll_offset(None), 0.0);
    }

    #[test]
    fn rendered_rows_follow_the_scroll_offset() {
        let mut page = SyntheticPage::document(10.0, 100.0, 1000.0);
        page.set_tool_overlay_hidden(true);
        page.set_device_pixel_ratio(2.0);
        page.scroll_to(None, 300.0);
        let frame = page.render();
        assert_eq!(frame.dimensions(), (20, 200));
        assert_eq!(*frame.get_pixel(0, 0), SyntheticPage::content_color(600));
        assert_eq!(*frame.get_pixel(0, 199), SyntheticPage::content_color(799));
    }

    #[test]
    fn growth_applies_after_the_given_scroll() {
        let mut page = SyntheticPage::document(800.0, 1000.0, 3000.0);
        page.grow_after(2, 500.0);
        page.scroll_to(None, 0.0);
        assert_eq!(page.scroll_height(None), 3000.0);
        page.scroll_to(None, 1000.0);
        assert_eq!(page.scroll_height(None), 3500.0);
    }
}
