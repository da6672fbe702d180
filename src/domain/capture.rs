//! Capture session data model

use image::RgbaImage;

use super::CaptureError;

/// Non-owning reference to a live element on the page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// The element (or the document itself) whose offset is advanced during capture
///
/// Resolved once per session and never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollTarget {
    /// `None` means the document/window scrolls
    pub container: Option<ElementId>,
    /// Estimated scrollable content height in CSS pixels
    pub content_height: f64,
    /// Visible height of the scroller in CSS pixels
    pub viewport_height: f64,
    /// Visible width of the window in CSS pixels
    pub viewport_width: f64,
}

impl ScrollTarget {
    pub fn is_document(&self) -> bool {
        self.container.is_none()
    }
}

/// Image data returned by a capture primitive
#[derive(Clone, Debug)]
pub enum Bitmap {
    /// Encoded image bytes (PNG, JPEG, ...) still to be decoded
    Encoded(Vec<u8>),
    /// Already decoded pixels
    Rgba(RgbaImage),
}

impl Bitmap {
    /// Decode into RGBA pixels
    pub fn decode(&self) -> Result<RgbaImage, CaptureError> {
        match self {
            Bitmap::Rgba(img) => Ok(img.clone()),
            Bitmap::Encoded(bytes) => Ok(image::load_from_memory(bytes)?.to_rgba8()),
        }
    }
}

impl From<RgbaImage> for Bitmap {
    fn from(img: RgbaImage) -> Self {
        Bitmap::Rgba(img)
    }
}

/// One scroll increment of a capture run
#[derive(Clone, Debug)]
pub struct CaptureStep {
    /// Offset the driver asked the scroller for
    pub requested_offset: f64,
    /// Offset the scroller actually reached; authoritative for placement
    pub actual_offset: f64,
    pub bitmap: Bitmap,
    /// CSS pixels of fresh content this step contributes
    pub captured_height: f64,
}

/// Stitched raster plus the ratio it was captured at
#[derive(Clone, Debug, PartialEq)]
pub struct Composite {
    pub image: RgbaImage,
    pub device_pixel_ratio: f64,
}

impl Composite {
    pub fn new(image: RgbaImage, device_pixel_ratio: f64) -> Self {
        Self {
            image,
            device_pixel_ratio,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
