//! Camera Module
//!
//! Frame sources for the QR scanner. A source opens a stream for a requested
//! facing mode and classifies acquisition failures into [`CameraError`].

pub mod error;
pub mod image_sequence;
pub mod source;

pub use error::{CameraError, CameraErrorKind};
pub use image_sequence::{CameraDevice, ImageSequenceSource, ImageSequenceStream};
pub use source::{acquire_with_timeout, CameraStream, DisabledSource, FacingMode, FrameSource};
