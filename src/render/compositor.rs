//! Stitch capture steps into one composite
//!
//! Steps are drawn in capture order onto an oversized working canvas at their
//! actual scroll offset, so later steps overwrite the overlapping tail of
//! earlier ones. The canvas is then cropped to the lowest captured row.

use image::{RgbaImage, imageops};

use crate::config::CaptureConfig;
use crate::domain::{CaptureError, CaptureStep, Composite, ScrollTarget};

pub struct Compositor {
    safety_margin: f64,
}

impl Compositor {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            safety_margin: config.canvas_safety_margin,
        }
    }

    pub fn composite(
        &self,
        target: &ScrollTarget,
        steps: &[CaptureStep],
        device_pixel_ratio: f64,
    ) -> Result<Composite, CaptureError> {
        if steps.is_empty() {
            return Err(CaptureError::CompositionIncomplete(
                "capture run produced no steps".to_string(),
            ));
        }

        let width = (target.viewport_width * device_pixel_ratio).round() as u32;
        let max_captured_y = steps
            .iter()
            .map(|step| step.actual_offset + target.viewport_height)
            .fold(0.0_f64, f64::max);
        let final_height = (max_captured_y * device_pixel_ratio).round() as u32;
        if width == 0 || final_height == 0 {
            return Err(CaptureError::CompositionIncomplete(format!(
                "empty composite ({width}x{final_height})"
            )));
        }

        let working_height = (((target.content_height + self.safety_margin)
            * device_pixel_ratio)
            .round() as u32)
            .max(final_height);
        log::debug!("Working canvas {width}x{working_height}");

        let mut canvas = RgbaImage::new(width, working_height);
        for step in steps {
            let mut frame = step.bitmap.decode()?;
            if frame.width() != width {
                // Stretch horizontally only, rows keep their native height
                frame = imageops::resize(&frame, width, frame.height(), imageops::FilterType::Lanczos3);
            }
            let y = (step.actual_offset * device_pixel_ratio).round() as i64;
            imageops::replace(&mut canvas, &frame, 0, y);
        }

        let image = imageops::crop_imm(&canvas, 0, 0, width, final_height).to_image();
        log::info!("Composite {}x{} at {}x", image.width(), image.height(), device_pixel_ratio);
        Ok(Composite::new(image, device_pixel_ratio))
    }
}
