//! Vertical stacking of rendered document pages

use image::{RgbaImage, imageops};

use crate::domain::CaptureError;

/// Stack page bitmaps top to bottom, left aligned, on a canvas as wide as the widest page
pub fn stack_pages(pages: &[RgbaImage]) -> Result<RgbaImage, CaptureError> {
    let width = pages.iter().map(RgbaImage::width).max().unwrap_or(0);
    let height: u32 = pages.iter().map(RgbaImage::height).sum();
    if width == 0 || height == 0 {
        return Err(CaptureError::CompositionIncomplete(
            "document rendered no pages".to_string(),
        ));
    }

    let mut canvas = RgbaImage::new(width, height);
    let mut y = 0i64;
    for page in pages {
        imageops::replace(&mut canvas, page, 0, y);
        y += i64::from(page.height());
    }
    log::debug!("Stacked {} pages into {width}x{height}", pages.len());
    Ok(canvas)
}
