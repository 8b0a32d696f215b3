//! Decoded video frames and where they come from.
//!
//! The masking stage operates on frames handed over by a host pipeline.
//! This module provides the frame representation the stage expects, the
//! pixel-format catalogue it negotiates, and simple sources and sinks for
//! driving it outside of a host.

mod format;
mod frame;
mod source;

pub use format::{FormatError, PixelFormat};
pub use frame::{FrameGeometry, Plane, VideoFrame};
pub use source::{FrameSource, RawVideoReader, RawVideoWriter, SourceError, SyntheticSource};
