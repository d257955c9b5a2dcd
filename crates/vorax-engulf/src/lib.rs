//! VORAX engulfment engines
//!
//! The three controllers that drive the containment lifecycle:
//! [`CaptureController`] moves free objects into a capturer,
//! [`DigestionProcessor`] extracts material from held objects each tick,
//! and [`ReleaseController`] runs the phased expulsion sequence plus the
//! forced-reset death paths.

mod capture;
mod digestion;
mod release;

pub use capture::{CaptureConfig, CaptureController};
pub use digestion::{DigestionConfig, DigestionProcessor, DigestionReport};
pub use release::{ReleaseConfig, ReleaseController};
