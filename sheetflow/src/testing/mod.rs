//! Testing utilities for sheetflow.
//!
//! This module provides:
//! - A tracing capture layer for log assertions
//! - Recording monitors

mod capture;
mod monitors;

pub use capture::{CapturedLog, LogCapture};
pub use monitors::RecordingMonitor;
