//! Selection & annotation engine
//!
//! The session owns the captured composite (the base layer) and a separate
//! transparent annotation overlay. The two are only merged when a crop is
//! applied or an export is requested; everything else edits the overlay or
//! the selection and leaves the base untouched.
//!
//! Pointer input arrives in display coordinates and is scaled to native
//! pixels with the ratio between the image size and its on-screen size.

mod history;
mod selection;

pub use history::{AnnotationHistory, Undo};
pub use selection::SelectionState;

use image::{RgbaImage, imageops};
use tiny_skia::{Color, Pixmap};

use crate::config::{EditorConfig, PenColor};
use crate::domain::{
    Composite, EditorError, PenStroke, Point, Rect, SelectionOutcome, SelectionRect, Tool,
};
use crate::render::stroke;

/// Pen width bounds in display pixels
pub const PEN_WIDTH_RANGE: (f32, f32) = (1.0, 10.0);

pub struct EditorSession {
    base: Composite,
    overlay: Pixmap,
    history: AnnotationHistory,
    selection: SelectionState,
    stroke: Option<PenStroke>,
    tool: Tool,
    pen_color: PenColor,
    pen_width: f32,
    display_size: (f32, f32),
    config: EditorConfig,
}

impl EditorSession {
    pub fn new(base: Composite, config: &EditorConfig) -> Result<Self, EditorError> {
        let overlay = stroke::blank_layer(base.width(), base.height()).ok_or(EditorError::EmptyImage)?;
        let history = AnnotationHistory::seeded(overlay.clone());
        let selection = SelectionState::new(base.width(), base.height(), config.min_selection_size);
        let display_size = (base.width() as f32, base.height() as f32);
        Ok(Self {
            base,
            overlay,
            history,
            selection,
            stroke: None,
            tool: Tool::None,
            pen_color: config.pen_color,
            pen_width: config
                .pen_width
                .clamp(PEN_WIDTH_RANGE.0, PEN_WIDTH_RANGE.1),
            display_size,
            config: config.clone(),
        })
    }

    /// Swap in a new base image; overlay, selection and history start over
    pub fn replace_base(&mut self, base: Composite) -> Result<(), EditorError> {
        let overlay = stroke::blank_layer(base.width(), base.height()).ok_or(EditorError::EmptyImage)?;
        log::debug!("Editor base is now {}x{}", base.width(), base.height());
        self.history = AnnotationHistory::seeded(overlay.clone());
        self.selection = SelectionState::new(base.width(), base.height(), self.config.min_selection_size);
        self.overlay = overlay;
        self.stroke = None;
        self.display_size = (base.width() as f32, base.height() as f32);
        self.base = base;
        Ok(())
    }

    pub fn base(&self) -> &Composite {
        &self.base
    }

    /// Overlay pixels for preview (straight alpha)
    pub fn overlay_image(&self) -> RgbaImage {
        stroke::rgba_from_pixmap(&self.overlay)
    }

    pub fn history(&self) -> &AnnotationHistory {
        &self.history
    }

    /// On-screen size the image is currently shown at
    pub fn set_display_size(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.display_size = (width, height);
        }
    }

    /// Native pixels per display pixel, per axis
    fn scale(&self) -> (f32, f32) {
        (
            self.base.width() as f32 / self.display_size.0,
            self.base.height() as f32 / self.display_size.1,
        )
    }

    fn to_native(&self, p: Point) -> Point {
        let (sx, sy) = self.scale();
        p.scale(sx, sy)
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Toggle a tool; enabling one disables the other
    pub fn toggle_tool(&mut self, tool: Tool) {
        let next = if self.tool == tool { Tool::None } else { tool };
        if self.tool == Tool::Select && next != Tool::Select {
            self.selection.clear();
        }
        if self.tool == Tool::Pen && next != Tool::Pen && self.stroke.is_some() {
            self.end_stroke();
        }
        self.tool = next;
    }

    pub fn pen_color(&self) -> PenColor {
        self.pen_color
    }

    pub fn set_pen_color(&mut self, color: PenColor) {
        self.pen_color = color;
    }

    pub fn pen_width(&self) -> f32 {
        self.pen_width
    }

    pub fn set_pen_width(&mut self, width: f32) {
        self.pen_width = width.clamp(PEN_WIDTH_RANGE.0, PEN_WIDTH_RANGE.1);
    }

    pub fn palette(&self) -> &[PenColor] {
        &self.config.palette
    }

    pub fn selection(&self) -> Option<SelectionRect> {
        self.selection.rect()
    }

    /// `"W × H"` label for the current selection
    pub fn selection_label(&self) -> Option<String> {
        self.selection.rect().map(|r| r.size_label())
    }

    pub fn begin_selection(&mut self, p: Point) {
        if self.tool != Tool::Select {
            return;
        }
        let (sx, sy) = self.scale();
        let tolerance = self.config.handle_tolerance * sx.max(sy);
        let mode = self.selection.begin(self.to_native(p), tolerance);
        log::trace!("Selection drag: {mode:?}");
    }

    pub fn update_selection(&mut self, p: Point) {
        if self.tool != Tool::Select {
            return;
        }
        let p = self.to_native(p);
        self.selection.update(p);
    }

    pub fn end_selection(&mut self) -> SelectionOutcome {
        if self.tool != Tool::Select {
            return SelectionOutcome::Idle;
        }
        self.selection.end()
    }

    pub fn start_stroke(&mut self, p: Point) {
        if self.tool != Tool::Pen {
            return;
        }
        let p = self.to_native(p);
        let (sx, _) = self.scale();
        self.stroke = Some(PenStroke::new((p.x, p.y), self.pen_color, self.pen_width * sx));
    }

    pub fn extend_stroke(&mut self, p: Point) {
        let p = self.to_native(p);
        let Some(current) = self.stroke.as_mut() else {
            return;
        };
        let from = current.last_point();
        current.points.push((p.x, p.y));
        stroke::draw_segment(&mut self.overlay, from, (p.x, p.y), current.color, current.width);
    }

    /// Finish the stroke and snapshot the overlay
    pub fn end_stroke(&mut self) {
        let Some(finished) = self.stroke.take() else {
            return;
        };
        if finished.points.len() == 1 {
            stroke::draw_stroke(&mut self.overlay, &finished);
        }
        self.history.push(self.overlay.clone());
    }

    pub fn undo(&mut self) {
        self.stroke = None;
        match self.history.undo() {
            Undo::Restore(snapshot) => self.overlay = snapshot.clone(),
            Undo::Clear => self.overlay.fill(Color::TRANSPARENT),
            Undo::Nothing => {}
        }
    }

    /// Wipe every annotation; the next undo has nothing left to undo
    pub fn clear_annotations(&mut self) {
        self.stroke = None;
        self.overlay.fill(Color::TRANSPARENT);
        self.history.rewind();
    }

    /// Bake the overlay into the base and keep only the selected rectangle
    ///
    /// Without a usable selection nothing changes and the selection is cleared.
    pub fn apply_crop(&mut self) -> Result<(), EditorError> {
        let Some(selection) = self.selection.rect() else {
            self.selection.clear();
            return Err(EditorError::NoSelection);
        };
        if selection.is_below(self.config.min_selection_size) {
            self.selection.clear();
            return Err(EditorError::NoSelection);
        }

        let merged = stroke::flatten(&self.base.image, &self.overlay);
        let cropped = crop_to(&merged, selection)?;
        log::info!("Applied crop {}", selection.size_label());
        let dpr = self.base.device_pixel_ratio;
        self.replace_base(Composite::new(cropped, dpr))
    }

    /// Flatten base and overlay for export, optionally limited to the selection
    pub fn merge_for_export(&self, restrict_to_selection: bool) -> Result<RgbaImage, EditorError> {
        let merged = stroke::flatten(&self.base.image, &self.overlay);
        match self.selection.rect() {
            Some(selection) if restrict_to_selection => crop_to(&merged, selection),
            _ => Ok(merged),
        }
    }
}

fn crop_to(img: &RgbaImage, selection: SelectionRect) -> Result<RgbaImage, EditorError> {
    let bounds = Rect::new(0, 0, img.width() as i32, img.height() as i32);
    let area = selection
        .to_rect()
        .intersect(bounds)
        .ok_or(EditorError::EmptyImage)?
        .to_selection();
    Ok(imageops::crop_imm(img, area.x, area.y, area.width, area.height).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DragMode;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn session(width: u32, height: u32) -> EditorSession {
        let base = Composite::new(RgbaImage::from_pixel(width, height, WHITE), 1.0);
        EditorSession::new(base, &EditorConfig::default()).unwrap()
    }

    fn select(editor: &mut EditorSession, from: (f32, f32), to: (f32, f32)) -> SelectionOutcome {
        editor.begin_selection(Point::new(from.0, from.1));
        editor.update_selection(Point::new(to.0, to.1));
        editor.end_selection()
    }

    fn scribble(editor: &mut EditorSession, y: f32) {
        editor.start_stroke(Point::new(10.0, y));
        editor.extend_stroke(Point::new(60.0, y));
        editor.extend_stroke(Point::new(90.0, y + 5.0));
        editor.end_stroke();
    }

    fn is_blank(editor: &EditorSession) -> bool {
        editor.overlay_image().pixels().all(|px| px[3] == 0)
    }

    #[test]
    fn selection_scenario_in_native_pixels() {
        let mut editor = session(1000, 800);
        editor.toggle_tool(Tool::Select);
        select(&mut editor, (10.0, 10.0), (400.0, 300.0));
        editor.begin_selection(Point::new(400.0, 300.0));
        editor.update_selection(Point::new(500.0, 300.0));
        editor.end_selection();
        assert_eq!(
            editor.selection(),
            Some(SelectionRect {
                x: 10,
                y: 10,
                width: 490,
                height: 290
            })
        );
        assert_eq!(editor.selection_label().as_deref(), Some("490 × 290"));
    }

    #[test]
    fn display_coordinates_are_scaled_to_native() {
        let mut editor = session(2000, 1600);
        editor.set_display_size(1000.0, 800.0);
        editor.toggle_tool(Tool::Select);
        select(&mut editor, (10.0, 10.0), (110.0, 60.0));
        assert_eq!(
            editor.selection(),
            Some(SelectionRect {
                x: 20,
                y: 20,
                width: 200,
                height: 100
            })
        );
    }

    #[test]
    fn handle_tolerance_follows_display_scale() {
        let mut editor = session(2000, 1600);
        editor.set_display_size(1000.0, 800.0);
        editor.toggle_tool(Tool::Select);
        select(&mut editor, (10.0, 10.0), (110.0, 60.0));

        // 8 display px off the corner is 16 native px, inside 10 * 2
        editor.begin_selection(Point::new(118.0, 68.0));
        assert_eq!(editor.selection.drag_mode(), Some(DragMode::ResizeSE));
        editor.update_selection(Point::new(130.0, 80.0));
        editor.end_selection();
        assert_eq!(
            editor.selection(),
            Some(SelectionRect {
                x: 20,
                y: 20,
                width: 240,
                height: 140
            })
        );

        // 12 display px off the new corner is 24 native px, a fresh rect
        editor.begin_selection(Point::new(142.0, 92.0));
        assert_eq!(editor.selection.drag_mode(), Some(DragMode::Create));
    }

    #[test]
    fn stroke_width_follows_display_scale() {
        let mut editor = session(400, 400);
        editor.set_display_size(200.0, 200.0);
        editor.toggle_tool(Tool::Pen);
        editor.set_pen_width(3.0);
        editor.start_stroke(Point::new(10.0, 100.0));
        editor.extend_stroke(Point::new(190.0, 100.0));
        editor.end_stroke();

        // 3 display px at 2x is 6 native px centred on row 200
        let overlay = editor.overlay_image();
        assert_eq!(overlay.get_pixel(200, 198)[3], 255);
        assert_eq!(overlay.get_pixel(200, 201)[3], 255);
        assert_eq!(overlay.get_pixel(200, 205)[3], 0);
    }

    #[test]
    fn undo_is_lifo_over_strokes() {
        let mut editor = session(100, 100);
        editor.toggle_tool(Tool::Pen);
        scribble(&mut editor, 20.0);
        let after_first = editor.overlay_image();
        scribble(&mut editor, 60.0);
        assert_ne!(editor.overlay_image(), after_first);

        editor.undo();
        assert_eq!(editor.overlay_image(), after_first);
        editor.undo();
        assert!(is_blank(&editor));
        // Past the blank snapshot: clears, then does nothing
        editor.undo();
        assert!(is_blank(&editor));
        assert!(!editor.history().can_undo());
        editor.undo();
        assert!(is_blank(&editor));
    }

    #[test]
    fn clear_annotations_leaves_nothing_to_undo() {
        let mut editor = session(100, 100);
        editor.toggle_tool(Tool::Pen);
        scribble(&mut editor, 20.0);
        editor.clear_annotations();
        assert!(is_blank(&editor));
        editor.undo();
        assert!(is_blank(&editor));
    }

    #[test]
    fn pen_is_ignored_outside_pen_tool() {
        let mut editor = session(100, 100);
        scribble(&mut editor, 20.0);
        assert!(is_blank(&editor));
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn tools_are_exclusive_and_select_off_drops_selection() {
        let mut editor = session(500, 500);
        editor.toggle_tool(Tool::Select);
        select(&mut editor, (10.0, 10.0), (200.0, 200.0));
        assert!(editor.selection().is_some());

        editor.toggle_tool(Tool::Pen);
        assert_eq!(editor.tool(), Tool::Pen);
        assert_eq!(editor.selection(), None);

        editor.toggle_tool(Tool::Pen);
        assert_eq!(editor.tool(), Tool::None);
        assert_eq!(editor.palette().len(), 5);
        assert_eq!(editor.pen_color(), editor.palette()[0]);
    }

    #[test]
    fn crop_bakes_annotations_and_resets_history() {
        let mut editor = session(300, 200);
        editor.toggle_tool(Tool::Pen);
        editor.set_pen_color(PenColor::from_rgb8(0, 0, 0));
        editor.set_pen_width(4.0);
        editor.start_stroke(Point::new(0.0, 50.0));
        editor.extend_stroke(Point::new(300.0, 50.0));
        editor.end_stroke();

        editor.toggle_tool(Tool::Select);
        select(&mut editor, (100.0, 40.0), (200.0, 140.0));
        editor.apply_crop().unwrap();

        assert_eq!(editor.base().image.dimensions(), (100, 100));
        assert_eq!(*editor.base().image.get_pixel(50, 10), Rgba([0, 0, 0, 255]));
        assert_eq!(*editor.base().image.get_pixel(50, 80), WHITE);
        assert!(is_blank(&editor));
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn crop_with_tiny_selection_is_a_no_op() {
        let mut editor = session(300, 200);
        editor.toggle_tool(Tool::Select);
        let outcome = select(&mut editor, (100.0, 40.0), (104.0, 140.0));
        assert_eq!(outcome, SelectionOutcome::TooSmall);

        let before = editor.base().clone();
        assert!(matches!(editor.apply_crop(), Err(EditorError::NoSelection)));
        assert_eq!(editor.base(), &before);
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn export_can_be_limited_to_the_selection() {
        let mut editor = session(300, 200);
        assert_eq!(editor.merge_for_export(true).unwrap().dimensions(), (300, 200));
        editor.toggle_tool(Tool::Select);
        select(&mut editor, (0.0, 0.0), (50.0, 20.0));
        assert_eq!(editor.merge_for_export(true).unwrap().dimensions(), (50, 20));
        assert_eq!(editor.merge_for_export(false).unwrap().dimensions(), (300, 200));
    }
}
