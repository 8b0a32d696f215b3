//! Masking stage configuration.
//!
//! All three parameters are fixed once the stage is set up: block size and
//! look-back window size the history ring, and the threshold is part of the
//! same parameter set.

use serde::{Deserialize, Serialize};

/// Largest accepted block side in pixels.
pub const MAX_BLOCK_SIZE: u32 = 600;
/// Largest accepted normalized-delta threshold.
pub const MAX_THRESHOLD: f64 = 1000.0;
/// Largest accepted look-back window in frames.
pub const MAX_FRAME_BACK: u32 = 100;

/// How chroma samples are addressed relative to luma pixel `(i, j)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChromaAddressing {
    /// Chroma at `(i / 2, j / 2)` regardless of the pixel format.
    ///
    /// Correct for 4:2:0 only. For 4:4:4, 4:2:2 and 4:4:0 input the masked
    /// chroma region is misaligned with the luma block.
    #[default]
    Halved,
    /// Chroma at `(i >> sx, j >> sy)` using the format's subsampling.
    Native,
}

/// Configuration for the static-region mask.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Side of a square aggregation block, in luma pixels.
    pub block_size: u32,
    /// Normalized delta below which a block counts as static.
    pub threshold: f64,
    /// Number of frames to look back when comparing.
    pub frame_back: u32,
    /// Chroma addressing mode.
    pub chroma: ChromaAddressing,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            block_size: 20,
            threshold: 20.0,
            frame_back: 1,
            chroma: ChromaAddressing::Halved,
        }
    }
}

impl MaskConfig {
    /// Creates a configuration from the three core parameters.
    pub fn new(block_size: u32, threshold: f64, frame_back: u32) -> Self {
        Self {
            block_size,
            threshold,
            frame_back,
            ..Default::default()
        }
    }

    /// Returns a copy using the given chroma addressing mode.
    pub fn with_chroma(mut self, chroma: ChromaAddressing) -> Self {
        self.chroma = chroma;
        self
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A zero block would never advance the block walk.
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidBlockSize(self.block_size));
        }
        if !self.threshold.is_finite() || !(0.0..=MAX_THRESHOLD).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.frame_back == 0 || self.frame_back > MAX_FRAME_BACK {
            return Err(ConfigError::InvalidFrameBack(self.frame_back));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid block size {0} (must be 1-600)")]
    InvalidBlockSize(u32),
    #[error("invalid threshold {0} (must be 0-1000)")]
    InvalidThreshold(f64),
    #[error("invalid frame_back {0} (must be 1-100)")]
    InvalidFrameBack(u32),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
