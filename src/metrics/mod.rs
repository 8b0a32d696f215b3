//! Prometheus metrics exporter for the masking stage.
//!
//! # Metrics Exposed
//!
//! - `static_mask_frames_processed_total` - Frames run through the comparator
//! - `static_mask_frames_bypassed_total` - Frames passed through while disabled
//! - `static_mask_blocks_total` - Blocks examined
//! - `static_mask_blocks_masked_total` - Blocks blanked
//! - `static_mask_masked_ratio` - Masked fraction of the most recent frame
//! - `static_mask_grid_cells` - Cells in the block grid
//! - `static_mask_lookback_frames` - Configured look-back window
//!
//! # Example
//!
//! ```no_run
//! use static_mask::mask::{MaskConfig, StaticMask};
//! use static_mask::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let stage = StaticMask::new(MaskConfig::default()).expect("valid config");
//!
//! registry.update(&MetricsSnapshot::from_stage(&stage));
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{
    HealthReport, MetricsServer, MetricsServerConfig, MetricsState, ServerError, StageStatus,
};
