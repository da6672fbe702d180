//! Scroll capture pipeline
//!
//! This module consolidates:
//! - The capture primitive interface (primitive.rs)
//! - Settle strategies and capture call spacing (settle.rs, throttle.rs)
//! - Cancellation (cancel.rs)
//! - The capture step state machine (driver.rs)
//! - Whole-session orchestration and hand-off (session.rs)

mod cancel;
mod driver;
mod primitive;
mod session;
mod settle;
mod throttle;

pub use cancel::CancelFlag;
pub use driver::CaptureDriver;
pub use primitive::{CapturePrimitive, DocumentBitmapProvider};
pub use session::{CaptureMode, CaptureSession};
pub use settle::{FixedDelay, Immediate, SettlePhase, StableFrame};
pub use throttle::CaptureThrottle;
