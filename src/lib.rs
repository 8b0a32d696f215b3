//! Static Region Masking Library
//!
//! Detects blocks of a video stream whose content has not changed relative
//! to a frame seen a fixed number of steps earlier, and flattens them to a
//! neutral colour while leaving changing content untouched. Useful for
//! redacting logos, letterboxing and static overlays.
//!
//! # Architecture
//!
//! ```text
//! source → StaticMask::process → sink
//!              ↓
//!     grid · history ring · comparator
//!              ↓
//!           metrics
//! ```
//!
//! - **Geometry**: the block grid is resolved once per stream geometry
//! - **History**: `frame_back` slots of per-block sums, reused cyclically
//! - **Comparator**: sum, compare, blank if static, record
//!
//! # Example
//!
//! ```no_run
//! use static_mask::{
//!     mask::{MaskConfig, StaticMask},
//!     video::{FrameGeometry, FrameSource, PixelFormat, SyntheticSource},
//! };
//!
//! let geometry = FrameGeometry::new(320, 240, PixelFormat::Yuv420p);
//! let mut source = SyntheticSource::new(geometry, 10, 16).unwrap();
//!
//! let mut mask = StaticMask::new(MaskConfig::new(16, 4.0, 1)).unwrap();
//! mask.setup(geometry).unwrap();
//!
//! while let Some(mut frame) = source.next_frame().unwrap() {
//!     let report = mask.process(&mut frame).unwrap();
//!     println!("frame {}: {} blocks masked", report.frame_index, report.blocks_masked);
//! }
//!
//! mask.teardown();
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod mask;
pub mod metrics;
pub mod video;

// Re-export commonly used types at crate root
pub use config::FileConfig;
pub use mask::{
    ChromaAddressing, FrameTransformer, MaskConfig, MaskError, MaskReport, MaskStats, StaticMask,
};
pub use video::{FrameGeometry, FrameSource, PixelFormat, VideoFrame};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
