//! Clipboard placement
//!
//! Sinks declare the encoding they accept; re-encoding the composite into
//! that form happens here and not in the compositor.

use image::RgbaImage;

use crate::domain::OutputError;

use super::encode_png;

/// Image encoding a clipboard sink accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardFormat {
    /// `image/png` bytes
    Png,
    /// Raw 8-bit RGBA rows
    Rgba8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardPayload {
    Png(Vec<u8>),
    Rgba8 {
        width: u32,
        height: u32,
        bytes: Vec<u8>,
    },
}

pub trait ClipboardSink {
    fn format(&self) -> ClipboardFormat;

    /// Place the image; the error text is shown to the user
    fn write_image(&mut self, payload: ClipboardPayload) -> Result<(), String>;
}

/// Encode `image` for `sink` and write it
///
/// The caller keeps `image`, so a failed write can be retried or sent
/// elsewhere.
pub fn copy_to_clipboard<S: ClipboardSink + ?Sized>(
    sink: &mut S,
    image: &RgbaImage,
) -> Result<(), OutputError> {
    let payload = match sink.format() {
        ClipboardFormat::Png => ClipboardPayload::Png(encode_png(image)?),
        ClipboardFormat::Rgba8 => ClipboardPayload::Rgba8 {
            width: image.width(),
            height: image.height(),
            bytes: image.as_raw().clone(),
        },
    };
    sink.write_image(payload).map_err(|err| {
        log::error!("Clipboard write failed: {err}");
        OutputError::ClipboardWriteFailed(err)
    })?;
    log::info!("Copied {}x{} image to clipboard", image.width(), image.height());
    Ok(())
}

/// The system clipboard through arboard
#[cfg(feature = "clipboard")]
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(feature = "clipboard")]
impl ClipboardSink for SystemClipboard {
    fn format(&self) -> ClipboardFormat {
        // arboard wants ImageData { width, height, bytes } in RGBA order
        ClipboardFormat::Rgba8
    }

    fn write_image(&mut self, payload: ClipboardPayload) -> Result<(), String> {
        let ClipboardPayload::Rgba8 {
            width,
            height,
            bytes,
        } = payload
        else {
            return Err("unsupported clipboard encoding".to_string());
        };
        let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
        clipboard
            .set_image(arboard::ImageData {
                width: width as usize,
                height: height as usize,
                bytes: std::borrow::Cow::Owned(bytes),
            })
            .map_err(|e| e.to_string())
    }
}

/// Keeps the last payload in memory; can be told to refuse writes
#[derive(Debug)]
pub struct MemoryClipboard {
    pub format: ClipboardFormat,
    pub contents: Option<ClipboardPayload>,
    pub refuse: Option<String>,
}

impl MemoryClipboard {
    pub fn new(format: ClipboardFormat) -> Self {
        Self {
            format,
            contents: None,
            refuse: None,
        }
    }
}

impl ClipboardSink for MemoryClipboard {
    fn format(&self) -> ClipboardFormat {
        self.format
    }

    fn write_image(&mut self, payload: ClipboardPayload) -> Result<(), String> {
        if let Some(reason) = &self.refuse {
            return Err(reason.clone());
        }
        self.contents = Some(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_sinks_get_png_bytes() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]));
        let mut sink = MemoryClipboard::new(ClipboardFormat::Png);
        copy_to_clipboard(&mut sink, &img).unwrap();
        let Some(ClipboardPayload::Png(bytes)) = sink.contents else {
            panic!("expected png payload");
        };
        assert_eq!(super::super::decode_image(&bytes).unwrap(), img);
    }

    #[test]
    fn raw_sinks_get_rgba_rows() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([9, 8, 7, 6]));
        let mut sink = MemoryClipboard::new(ClipboardFormat::Rgba8);
        copy_to_clipboard(&mut sink, &img).unwrap();
        assert_eq!(
            sink.contents,
            Some(ClipboardPayload::Rgba8 {
                width: 2,
                height: 1,
                bytes: vec![9, 8, 7, 6, 9, 8, 7, 6],
            })
        );
    }

    #[test]
    fn refusal_is_reported() {
        let img = RgbaImage::new(1, 1);
        let mut sink = MemoryClipboard::new(ClipboardFormat::Png);
        sink.refuse = Some("permission denied".to_string());
        let err = copy_to_clipboard(&mut sink, &img).unwrap_err();
        assert!(matches!(err, OutputError::ClipboardWriteFailed(ref m) if m == "permission denied"));
    }
}
