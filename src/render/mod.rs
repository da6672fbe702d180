//! Raster work
//!
//! This module contains:
//! - The compositor that stitches capture steps (compositor.rs)
//! - Vertical stacking of document pages (document.rs)
//! - Pen stroke rendering and layer conversion using tiny-skia (stroke.rs)

mod compositor;
mod document;
pub mod stroke;

pub use compositor::Compositor;
pub use document::stack_pages;
