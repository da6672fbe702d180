//! Pen stroke rendering using tiny-skia
//!
//! The annotation overlay is a premultiplied [`Pixmap`]; the composite is a
//! straight-alpha [`RgbaImage`]. The helpers here move pixels between the
//! two and stroke polylines with round caps and joins.

use image::{RgbaImage, imageops};
use tiny_skia::{
    ColorU8, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use crate::config::PenColor;
use crate::domain::PenStroke;

/// Transparent layer of the given size
pub fn blank_layer(width: u32, height: u32) -> Option<Pixmap> {
    Pixmap::new(width, height)
}

/// Convert a straight-alpha image into a premultiplied pixmap
pub fn pixmap_from_rgba(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let mut pixmap = Pixmap::new(size.width(), size.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Convert a premultiplied pixmap back to a straight-alpha image
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    img
}

/// Blend `overlay` over a copy of `base`
pub fn flatten(base: &RgbaImage, overlay: &Pixmap) -> RgbaImage {
    let mut merged = base.clone();
    imageops::overlay(&mut merged, &rgba_from_pixmap(overlay), 0, 0);
    merged
}

fn pen_paint(color: PenColor) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Stroke one segment of a pen stroke
///
/// A zero-length segment leaves a round dot of the stroke width.
pub fn draw_segment(
    pixmap: &mut Pixmap,
    from: (f32, f32),
    to: (f32, f32),
    color: PenColor,
    width: f32,
) {
    let paint = pen_paint(color);

    if from == to {
        if let Some(dot) = PathBuilder::from_circle(from.0, from.1, width / 2.0) {
            pixmap.fill_path(
                &dot,
                &paint,
                tiny_skia::FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(from.0, from.1);
    pb.line_to(to.0, to.1);
    let Some(path) = pb.finish() else {
        return;
    };

    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Draw a whole stroke
pub fn draw_stroke(pixmap: &mut Pixmap, stroke: &PenStroke) {
    match stroke.points.as_slice() {
        [] => {}
        [only] => draw_segment(pixmap, *only, *only, stroke.color, stroke.width),
        points => {
            for pair in points.windows(2) {
                draw_segment(pixmap, pair[0], pair[1], stroke.color, stroke.width);
            }
        }
    }
}
