//! Pure domain types with minimal dependencies
//!
//! Types here should not depend on the page, capture or output layers
//! so every other module can share them.

pub mod annotation;
pub mod capture;
pub mod error;
pub mod geometry;
pub mod selection;

pub use annotation::*;
pub use capture::*;
pub use error::*;
pub use geometry::*;
pub use selection::*;
