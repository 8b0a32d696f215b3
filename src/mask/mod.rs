//! Temporal static-region detection and masking.
//!
//! Each frame is tiled into square blocks. A block's fingerprint (the sum
//! of its luma and co-located chroma samples) is compared with the
//! fingerprint recorded for the same block `frame_back` frames earlier;
//! blocks whose normalized delta falls below the threshold are overwritten
//! with neutral values. Fingerprints are always recorded, masked or not.

mod comparator;
mod config;
mod grid;
mod history;
mod stage;
mod stats;

pub use comparator::{
    block_sum, chroma_shift, fill_neutral, is_static, normalized_delta, BLANK_CHROMA, BLANK_LUMA,
};
pub use config::{
    ChromaAddressing, ConfigError, MaskConfig, MAX_BLOCK_SIZE, MAX_FRAME_BACK, MAX_THRESHOLD,
};
pub use grid::{BlockGrid, BlockRect};
pub use history::HistoryRing;
pub use stage::{FrameTransformer, MaskError, StaticMask};
pub use stats::{MaskReport, MaskStats};
