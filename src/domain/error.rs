//! Error taxonomy shared by the capture, editor and output layers
//!
//! Ambiguous scroll targets and undersized selections are not errors: they
//! are recovered locally (see `page::ResolvedBy::Fallback` and
//! [`super::SelectionOutcome::TooSmall`]).

use thiserror::Error;

/// Fatal failures of a capture run
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The external capture primitive refused or failed a step
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// An internal invariant was broken, e.g. the run produced no steps
    #[error("composition incomplete: {0}")]
    CompositionIncomplete(String),

    #[error("capture cancelled")]
    Cancelled,

    #[error("failed to decode captured frame: {0}")]
    Decode(#[from] image::ImageError),

    #[error("document is too large to capture ({size} bytes, limit {limit})")]
    DocumentTooLarge { size: usize, limit: usize },

    #[error("document rendering failed: {0}")]
    DocumentRender(String),

    /// Non-HTML documents cannot be scroll-captured, only rendered
    #[error("{content_type} document cannot be scrolled")]
    BinaryDocument { content_type: String },
}

impl CaptureError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::CaptureUnavailable(reason) => {
                format!("Failed to capture full page. {reason}")
            }
            CaptureError::Cancelled => "Capture cancelled.".to_string(),
            CaptureError::DocumentTooLarge { .. } => {
                "Document is too large to capture directly. Download it to view.".to_string()
            }
            other => format!("Failed to capture full page. {other}"),
        }
    }
}

/// Failures of the selection and annotation engine
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no selection to apply")]
    NoSelection,

    #[error("image has zero width or height")]
    EmptyImage,
}

/// Failures of the output adapters
#[derive(Debug, Error)]
pub enum OutputError {
    /// The clipboard refused the image; the composite is kept for retry
    #[error("clipboard write failed: {0}")]
    ClipboardWriteFailed(String),

    #[error("failed to encode png: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to write pdf: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("not a base64 image data uri")]
    InvalidDataUri,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
