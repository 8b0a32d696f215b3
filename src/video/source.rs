//! Frame sources and sinks.
//!
//! The masking stage only ever sees decoded planar frames. These types
//! stand in for the host pipeline: a trait-based source so tests can swap
//! a synthetic generator for a raw video stream, and a writer for the
//! masked output.

use super::{FrameGeometry, VideoFrame};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Errors that can occur while reading or writing frames.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("truncated frame {sequence}: got {got} of {expected} bytes")]
    TruncatedFrame {
        sequence: u64,
        got: usize,
        expected: usize,
    },
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("frame {sequence} does not match stream geometry {expected}")]
    GeometryMismatch {
        sequence: u64,
        expected: FrameGeometry,
    },
}

/// Trait for anything that yields decoded frames in arrival order.
pub trait FrameSource {
    /// Geometry shared by every frame of the stream.
    fn geometry(&self) -> FrameGeometry;

    /// Returns the next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, SourceError>;
}

fn check_geometry(geometry: &FrameGeometry) -> Result<(), SourceError> {
    if geometry.width == 0 || geometry.height == 0 {
        return Err(SourceError::InvalidGeometry(format!(
            "frame dimensions must be non-zero, got {}x{}",
            geometry.width, geometry.height
        )));
    }
    Ok(())
}

/// Reads back-to-back tightly packed planar frames.
pub struct RawVideoReader<R> {
    reader: R,
    geometry: FrameGeometry,
    buffer: Vec<u8>,
    sequence: u64,
}

impl<R: Read> RawVideoReader<R> {
    pub fn new(reader: R, geometry: FrameGeometry) -> Result<Self, SourceError> {
        check_geometry(&geometry)?;
        Ok(Self {
            reader,
            geometry,
            buffer: vec![0u8; geometry.frame_size()],
            sequence: 0,
        })
    }

    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.sequence
    }

    /// Fills the buffer, returning how many bytes were read before EOF.
    fn fill(&mut self) -> Result<usize, SourceError> {
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> FrameSource for RawVideoReader<R> {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, SourceError> {
        let got = self.fill()?;
        if got == 0 {
            return Ok(None);
        }
        if got < self.buffer.len() {
            return Err(SourceError::TruncatedFrame {
                sequence: self.sequence,
                got,
                expected: self.buffer.len(),
            });
        }

        let frame = VideoFrame::from_bytes(self.geometry, &self.buffer, self.sequence).ok_or(
            SourceError::GeometryMismatch {
                sequence: self.sequence,
                expected: self.geometry,
            },
        )?;
        self.sequence += 1;
        Ok(Some(frame))
    }
}

/// Writes frames tightly packed, one after another.
pub struct RawVideoWriter<W: Write> {
    writer: W,
    scratch: Vec<u8>,
    frames_written: u64,
}

impl<W: Write> RawVideoWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            scratch: Vec::new(),
            frames_written: 0,
        }
    }

    pub fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), SourceError> {
        self.scratch.clear();
        frame.write_bytes(&mut self.scratch);
        self.writer.write_all(&self.scratch)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flushes and returns the inner writer.
    pub fn finish(mut self) -> Result<W, SourceError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Deterministic test-pattern source.
///
/// Every frame has a flat background, letterbox bars top and bottom and a
/// bright square that moves one block to the right per frame. Only the
/// square changes between frames.
#[derive(Debug)]
pub struct SyntheticSource {
    geometry: FrameGeometry,
    frame_count: u64,
    square: usize,
    sequence: u64,
}

impl SyntheticSource {
    /// Creates a source yielding `frame_count` frames with a moving square of side `square`.
    pub fn new(
        geometry: FrameGeometry,
        frame_count: u64,
        square: usize,
    ) -> Result<Self, SourceError> {
        check_geometry(&geometry)?;
        if !geometry.format.is_planar_yuv() {
            return Err(SourceError::InvalidGeometry(format!(
                "synthetic frames need a planar YUV format, got {}",
                geometry.format
            )));
        }
        Ok(Self {
            geometry,
            frame_count,
            square: square.max(1),
            sequence: 0,
        })
    }

    fn render(&self) -> VideoFrame {
        let FrameGeometry {
            width,
            height,
            format,
        } = self.geometry;
        let mut frame = VideoFrame::new(format, width, height, self.sequence);
        let bar = height / 8;
        let (sx, sy) = format.chroma_shift().unwrap_or((0, 0));

        let origin_x = (self.sequence as usize * self.square) % width;
        let origin_y = height / 2 - (self.square / 2).min(height / 2);
        let inside_square = |x: usize, y: usize| {
            x >= origin_x && x < origin_x + self.square && y >= origin_y && y < origin_y + self.square
        };

        if let Some(luma) = frame.plane_mut(0) {
            for y in 0..height {
                for x in 0..width {
                    let value = if inside_square(x, y) {
                        235
                    } else if y < bar || y >= height - bar {
                        16
                    } else {
                        // Static gradient background.
                        (60 + (x * 80) / width + (y * 40) / height) as u8
                    };
                    luma.set(x, y, value);
                }
            }
        }

        for (index, base) in [(1usize, 110u8), (2, 150u8)] {
            if let Some(chroma) = frame.plane_mut(index) {
                for cy in 0..chroma.height() {
                    for cx in 0..chroma.width() {
                        let value = if inside_square(cx << sx, cy << sy) {
                            base.wrapping_add(40)
                        } else {
                            base
                        };
                        chroma.set(cx, cy, value);
                    }
                }
            }
        }

        frame
    }
}

impl FrameSource for SyntheticSource {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, SourceError> {
        if self.sequence >= self.frame_count {
            return Ok(None);
        }
        let frame = self.render();
        self.sequence += 1;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::PixelFormat;
    use std::io::Cursor;

    fn geometry() -> FrameGeometry {
        FrameGeometry::new(8, 8, PixelFormat::Yuv420p)
    }

    #[test]
    fn test_reader_splits_frames() {
        let size = geometry().frame_size();
        let bytes: Vec<u8> = (0..size * 2).map(|i| (i % 251) as u8).collect();
        let mut reader = RawVideoReader::new(Cursor::new(bytes.clone()), geometry()).unwrap();

        let first = reader.next_frame().unwrap().unwrap();
        let second = reader.next_frame().unwrap().unwrap();
        assert!(reader.next_frame().unwrap().is_none());

        assert_eq!(first.sequence(), 0);
        assert_eq!(second.sequence(), 1);
        assert_eq!(first.to_bytes(), bytes[..size]);
        assert_eq!(second.to_bytes(), bytes[size..]);
        assert_eq!(reader.frames_read(), 2);
    }

    #[test]
    fn test_reader_reports_truncation() {
        let size = geometry().frame_size();
        let mut reader =
            RawVideoReader::new(Cursor::new(vec![0u8; size + 3]), geometry()).unwrap();

        assert!(reader.next_frame().unwrap().is_some());
        assert!(matches!(
            reader.next_frame(),
            Err(SourceError::TruncatedFrame { got: 3, .. })
        ));
    }

    #[test]
    fn test_zero_geometry_rejected() {
        let bad = FrameGeometry::new(0, 8, PixelFormat::Yuv420p);
        assert!(matches!(
            RawVideoReader::new(Cursor::new(Vec::new()), bad),
            Err(SourceError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_writer_round_trips_reader() {
        let mut source = SyntheticSource::new(geometry(), 3, 2).unwrap();
        let mut writer = RawVideoWriter::new(Vec::new());
        let mut originals = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            writer.write_frame(&frame).unwrap();
            originals.push(frame.to_bytes());
        }
        assert_eq!(writer.frames_written(), 3);
        let bytes = writer.finish().unwrap();

        let mut reader = RawVideoReader::new(Cursor::new(bytes), geometry()).unwrap();
        for original in originals {
            assert_eq!(reader.next_frame().unwrap().unwrap().to_bytes(), original);
        }
    }

    #[test]
    fn test_synthetic_source_moves_square() {
        let mut source = SyntheticSource::new(geometry(), 2, 2).unwrap();
        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert!(source.next_frame().unwrap().is_none());

        let luma_a = first.plane(0).unwrap();
        let luma_b = second.plane(0).unwrap();
        // Letterbox row is identical, the square has moved.
        assert_eq!(luma_a.row(0), luma_b.row(0));
        assert_ne!(luma_a.row(4), luma_b.row(4));
    }

    #[test]
    fn test_synthetic_source_rejects_packed() {
        let packed = FrameGeometry::new(8, 8, PixelFormat::Rgb24);
        assert!(SyntheticSource::new(packed, 1, 2).is_err());
    }
}
