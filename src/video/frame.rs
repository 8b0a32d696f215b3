//! Planar video frame with per-plane strides.

use super::PixelFormat;

/// One plane of sample bytes.
///
/// Rows are `linesize` bytes apart; only the first `width` bytes of each
/// row are picture data.
#[derive(Clone, PartialEq, Eq)]
pub struct Plane {
    data: Vec<u8>,
    linesize: usize,
    width: usize,
    height: usize,
}

impl Plane {
    /// Creates a plane filled with `fill`, rows padded to `linesize`.
    pub fn new(width: usize, height: usize, linesize: usize, fill: u8) -> Self {
        let linesize = linesize.max(width);
        Self {
            data: vec![fill; linesize * height],
            linesize,
            width,
            height,
        }
    }

    /// Wraps existing bytes. Returns `None` if the buffer cannot hold
    /// `height` rows of `linesize` bytes or `linesize < width`.
    pub fn from_vec(data: Vec<u8>, width: usize, height: usize, linesize: usize) -> Option<Self> {
        if linesize < width || data.len() < linesize * height {
            return None;
        }
        Some(Self {
            data,
            linesize,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance in bytes between the starts of consecutive rows.
    #[inline]
    pub fn linesize(&self) -> usize {
        self.linesize
    }

    /// Raw bytes including stride padding.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample at `(x, y)`, `None` outside the picture area.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.linesize + x).copied()
    }

    /// Writes a sample. Returns false outside the picture area.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        match self.data.get_mut(y * self.linesize + x) {
            Some(sample) => {
                *sample = value;
                true
            }
            None => false,
        }
    }

    /// Picture bytes of row `y` (without padding).
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.linesize;
        &self.data[start..start + self.width]
    }

    /// Mutable picture bytes of row `y` (without padding).
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.linesize;
        &mut self.data[start..start + self.width]
    }

    /// Like [`Plane::row`], `None` past the last row.
    #[inline]
    pub fn try_row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.linesize;
        self.data.get(start..start + self.width)
    }

    /// Like [`Plane::row_mut`], `None` past the last row.
    #[inline]
    pub fn try_row_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.linesize;
        self.data.get_mut(start..start + self.width)
    }
}

impl std::fmt::Debug for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plane")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("linesize", &self.linesize)
            .finish()
    }
}

/// Dimensions and format a stage is configured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
}

impl FrameGeometry {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }

    /// Size in bytes of one tightly packed frame.
    pub fn frame_size(&self) -> usize {
        (0..self.format.plane_count())
            .map(|i| {
                let (w, h) = self.format.plane_dimensions(i, self.width, self.height);
                w * h
            })
            .sum()
    }
}

impl std::fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.format)
    }
}

/// A decoded video frame.
///
/// Planes follow the format's layout: luma, chroma U, chroma V and an
/// optional alpha plane for planar YUV; a single interleaved plane for
/// packed RGB formats.
#[derive(Clone)]
pub struct VideoFrame {
    format: PixelFormat,
    width: usize,
    height: usize,
    planes: Vec<Plane>,
    /// Monotonic sequence number assigned by the source.
    sequence: u64,
}

impl VideoFrame {
    /// Allocates a black frame with tight strides.
    ///
    /// Planar YUV planes start at luma 16, chroma 128 and alpha 255; the
    /// single plane of a packed format starts zeroed.
    pub fn new(format: PixelFormat, width: usize, height: usize, sequence: u64) -> Self {
        Self::with_linesize_padding(format, width, height, 0, sequence)
    }

    /// Allocates a black frame whose rows carry `padding` extra bytes.
    pub fn with_linesize_padding(
        format: PixelFormat,
        width: usize,
        height: usize,
        padding: usize,
        sequence: u64,
    ) -> Self {
        let planes = (0..format.plane_count())
            .map(|i| {
                let (w, h) = format.plane_dimensions(i, width, height);
                Plane::new(w, h, w + padding, blank_value(format, i))
            })
            .collect();

        Self {
            format,
            width,
            height,
            planes,
            sequence,
        }
    }

    /// Builds a frame from prepared planes, checking them against the format.
    pub fn from_planes(
        format: PixelFormat,
        width: usize,
        height: usize,
        planes: Vec<Plane>,
        sequence: u64,
    ) -> Option<Self> {
        let frame = Self {
            format,
            width,
            height,
            planes,
            sequence,
        };
        frame.is_valid().then_some(frame)
    }

    /// Splits one tightly packed frame (planes back to back) into planes.
    pub fn from_bytes(geometry: FrameGeometry, bytes: &[u8], sequence: u64) -> Option<Self> {
        if bytes.len() != geometry.frame_size() {
            return None;
        }

        let format = geometry.format;
        let mut offset = 0;
        let mut planes = Vec::with_capacity(format.plane_count());
        for i in 0..format.plane_count() {
            let (w, h) = format.plane_dimensions(i, geometry.width, geometry.height);
            let len = w * h;
            planes.push(Plane::from_vec(bytes[offset..offset + len].to_vec(), w, h, w)?);
            offset += len;
        }

        Self::from_planes(format, geometry.width, geometry.height, planes, sequence)
    }

    /// Appends the frame to `out` tightly packed, dropping stride padding.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        for plane in &self.planes {
            for y in 0..plane.height() {
                out.extend_from_slice(plane.row(y));
            }
        }
    }

    /// Returns the frame tightly packed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.geometry().frame_size());
        self.write_bytes(&mut out);
        out
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.width, self.height, self.format)
    }

    #[inline]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Plane by index, `None` if the format has fewer planes.
    #[inline]
    pub fn plane(&self, index: usize) -> Option<&Plane> {
        self.planes.get(index)
    }

    #[inline]
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut Plane> {
        self.planes.get_mut(index)
    }

    /// Mutable access to luma and both chroma planes at once.
    pub fn yuv_planes_mut(&mut self) -> Option<(&mut Plane, &mut Plane, &mut Plane)> {
        match self.planes.as_mut_slice() {
            [y, u, v, ..] => Some((y, u, v)),
            _ => None,
        }
    }

    /// Validates the plane set against the format and frame size.
    pub fn is_valid(&self) -> bool {
        self.planes.len() == self.format.plane_count()
            && self.planes.iter().enumerate().all(|(i, plane)| {
                let (w, h) = self.format.plane_dimensions(i, self.width, self.height);
                plane.width() == w
                    && plane.height() == h
                    && plane.data().len() >= plane.linesize() * h
            })
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("planes", &self.planes)
            .finish()
    }
}

/// Initial sample value for plane `index`: black luma, neutral chroma, opaque alpha.
fn blank_value(format: PixelFormat, index: usize) -> u8 {
    if !format.is_planar_yuv() {
        return 0;
    }
    match index {
        0 => 16,
        1 | 2 => 128,
        _ => 255,
    }
}
