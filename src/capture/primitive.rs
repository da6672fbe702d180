//! External collaborators the capture pipeline calls into

use image::RgbaImage;

use crate::domain::{Bitmap, CaptureError};

/// Captures whatever is currently visible in the viewport
///
/// Rate-sensitive: callers must keep a minimum spacing between calls
/// (see [`super::CaptureThrottle`]).
#[allow(async_fn_in_trait)]
pub trait CapturePrimitive {
    async fn capture_visible_viewport(&mut self) -> Result<Bitmap, CaptureError>;
}

/// Renders a non-HTML document (e.g. a PDF) into one bitmap per page
#[allow(async_fn_in_trait)]
pub trait DocumentBitmapProvider {
    async fn render_pages(&mut self, source: &[u8]) -> Result<Vec<RgbaImage>, CaptureError>;
}
