//! Output adapters
//!
//! Everything that leaves the process goes through here: PNG bytes, data
//! URIs for hand-off records, paginated PDFs and the clipboard.

mod clipboard;
mod handoff;
mod pdf;

pub use clipboard::{ClipboardFormat, ClipboardPayload, ClipboardSink, MemoryClipboard, copy_to_clipboard};
#[cfg(feature = "clipboard")]
pub use clipboard::SystemClipboard;
pub use handoff::{CaptureRecord, FileResultSink, MemoryResultSink, ResultSink};
pub use pdf::{paginate, write_pdf};

use std::io;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;

use crate::domain::OutputError;

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Write `image` as an 8-bit RGBA PNG
pub fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, OutputError> {
    let mut bytes = Vec::new();
    write_png(&mut bytes, image)?;
    Ok(bytes)
}

/// Decode any format the image crate understands
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, OutputError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Self-describing `data:image/png;base64,...` reference
pub fn to_data_uri(image: &RgbaImage) -> Result<String, OutputError> {
    let png = encode_png(image)?;
    Ok(format!("{PNG_DATA_URI_PREFIX}{}", STANDARD.encode(png)))
}

/// Decode a base64 image data URI of any image media type
pub fn from_data_uri(uri: &str) -> Result<RgbaImage, OutputError> {
    let rest = uri.strip_prefix("data:").ok_or(OutputError::InvalidDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(OutputError::InvalidDataUri)?;
    if !meta.starts_with("image/") || !meta.ends_with(";base64") {
        return Err(OutputError::InvalidDataUri);
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| OutputError::InvalidDataUri)?;
    decode_image(&bytes)
}
