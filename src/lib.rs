//! Scroll-capture and stitch pipeline for web pages
//!
//! The crate walks a page (or its dominant inner scroller) in viewport-sized
//! steps, captures each step through an external capture primitive, stitches
//! the frames into one composite and lets the user crop and annotate the
//! result before handing it to an output sink.

pub mod capture;
pub mod config;
pub mod domain;
pub mod editor;
pub mod output;
pub mod page;
pub mod render;

pub use capture::{CaptureSession, CaptureMode};
pub use config::Config;
pub use domain::{CaptureError, CaptureStep, Composite, ScrollTarget};
pub use editor::EditorSession;
