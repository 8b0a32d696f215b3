//! Pixel formats accepted at the stage boundary.
//!
//! The catalogue mirrors what a host pipeline may negotiate with the
//! masking stage. Only the planar YUV family is actually processed; the
//! packed RGB entries exist so that negotiation can name them and the
//! stage can refuse them with a precise error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised while naming or parsing pixel formats.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("unknown pixel format: {0}")]
    Unknown(String),
}

/// Supported pixel formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PixelFormat {
    Yuv444p,
    Yuv422p,
    Yuv420p,
    Yuv411p,
    Yuv410p,
    Yuvj444p,
    Yuvj422p,
    Yuvj420p,
    Yuv440p,
    Yuvj440p,
    Yuva420p,
    Yuva422p,
    Yuva444p,
    Rgb24,
    Bgr24,
    Rgba,
    Bgra,
    Argb,
    Abgr,
    Zrgb,
    Zbgr,
    Rgb0,
    Bgr0,
}

impl PixelFormat {
    /// Every format in negotiation order.
    pub const ALL: [PixelFormat; 23] = [
        PixelFormat::Yuv444p,
        PixelFormat::Yuv422p,
        PixelFormat::Yuv420p,
        PixelFormat::Yuv411p,
        PixelFormat::Yuv410p,
        PixelFormat::Yuvj444p,
        PixelFormat::Yuvj422p,
        PixelFormat::Yuvj420p,
        PixelFormat::Yuv440p,
        PixelFormat::Yuvj440p,
        PixelFormat::Yuva420p,
        PixelFormat::Yuva422p,
        PixelFormat::Yuva444p,
        PixelFormat::Rgb24,
        PixelFormat::Bgr24,
        PixelFormat::Rgba,
        PixelFormat::Bgra,
        PixelFormat::Argb,
        PixelFormat::Abgr,
        PixelFormat::Zrgb,
        PixelFormat::Zbgr,
        PixelFormat::Rgb0,
        PixelFormat::Bgr0,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Yuv444p => "yuv444p",
            PixelFormat::Yuv422p => "yuv422p",
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Yuv411p => "yuv411p",
            PixelFormat::Yuv410p => "yuv410p",
            PixelFormat::Yuvj444p => "yuvj444p",
            PixelFormat::Yuvj422p => "yuvj422p",
            PixelFormat::Yuvj420p => "yuvj420p",
            PixelFormat::Yuv440p => "yuv440p",
            PixelFormat::Yuvj440p => "yuvj440p",
            PixelFormat::Yuva420p => "yuva420p",
            PixelFormat::Yuva422p => "yuva422p",
            PixelFormat::Yuva444p => "yuva444p",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Bgr24 => "bgr24",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Bgra => "bgra",
            PixelFormat::Argb => "argb",
            PixelFormat::Abgr => "abgr",
            PixelFormat::Zrgb => "0rgb",
            PixelFormat::Zbgr => "0bgr",
            PixelFormat::Rgb0 => "rgb0",
            PixelFormat::Bgr0 => "bgr0",
        }
    }

    /// Returns true for the planar YUV family (with or without alpha).
    pub fn is_planar_yuv(self) -> bool {
        self.chroma_shift().is_some()
    }

    /// Returns true if the format carries a separate alpha plane.
    pub fn has_alpha_plane(self) -> bool {
        matches!(
            self,
            PixelFormat::Yuva420p | PixelFormat::Yuva422p | PixelFormat::Yuva444p
        )
    }

    /// Log2 chroma subsampling `(horizontal, vertical)` for planar YUV formats.
    pub fn chroma_shift(self) -> Option<(u32, u32)> {
        match self {
            PixelFormat::Yuv444p | PixelFormat::Yuvj444p | PixelFormat::Yuva444p => Some((0, 0)),
            PixelFormat::Yuv422p | PixelFormat::Yuvj422p | PixelFormat::Yuva422p => Some((1, 0)),
            PixelFormat::Yuv420p | PixelFormat::Yuvj420p | PixelFormat::Yuva420p => Some((1, 1)),
            PixelFormat::Yuv411p => Some((2, 0)),
            PixelFormat::Yuv410p => Some((2, 2)),
            PixelFormat::Yuv440p | PixelFormat::Yuvj440p => Some((0, 1)),
            _ => None,
        }
    }

    /// Bytes per pixel of the single plane of a packed format.
    fn packed_bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 3,
            _ => 4,
        }
    }

    /// Number of planes a frame of this format carries.
    pub fn plane_count(self) -> usize {
        if !self.is_planar_yuv() {
            1
        } else if self.has_alpha_plane() {
            4
        } else {
            3
        }
    }

    /// Byte dimensions `(width, height)` of plane `index` for a frame of the given size.
    ///
    /// Chroma planes round up, so odd frame sizes keep a chroma sample for
    /// the trailing luma column/row.
    pub fn plane_dimensions(self, index: usize, width: usize, height: usize) -> (usize, usize) {
        match self.chroma_shift() {
            None => (width * self.packed_bytes_per_pixel(), height),
            Some((sx, sy)) => match index {
                1 | 2 => (ceil_shift(width, sx), ceil_shift(height, sy)),
                _ => (width, height),
            },
        }
    }
}

fn ceil_shift(value: usize, shift: u32) -> usize {
    (value + (1 << shift) - 1) >> shift
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PixelFormat::ALL
            .iter()
            .copied()
            .find(|format| format.name() == wanted)
            .ok_or_else(|| FormatError::Unknown(s.to_string()))
    }
}

impl TryFrom<String> for PixelFormat {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PixelFormat> for String {
    fn from(format: PixelFormat) -> Self {
        format.name().to_string()
    }
}
