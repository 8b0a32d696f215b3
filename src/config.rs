//! Configuration file format.
//!
//! ```toml
//! [input]
//! width = 1280
//! height = 720
//! pixel_format = "yuv420p"
//!
//! [mask]
//! block_size = 16
//! threshold = 4.0
//! frame_back = 2
//! chroma = "halved"
//!
//! [output]
//! metrics_port = 0
//! log_every = 100
//! ```

use crate::mask::{ConfigError, MaskConfig};
use crate::video::{FrameGeometry, PixelFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry of the raw input stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    /// Pixel format of the raw frames.
    pub pixel_format: PixelFormat,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            pixel_format: PixelFormat::Yuv420p,
        }
    }
}

impl InputConfig {
    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.width, self.height, self.pixel_format)
    }
}

/// Output and reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
    /// Log a progress summary every N frames (0 to disable).
    pub log_every: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            metrics_port: 0,
            log_every: 100,
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub mask: MaskConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Parses configuration from TOML text and validates the mask section.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.mask.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }
}
