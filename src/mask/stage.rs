//! The static-region masking stage.
//!
//! Lifecycle: `new` validates parameters, `setup` resolves the block grid
//! for the stream geometry and allocates the history ring, `process` runs
//! once per frame in arrival order, `teardown` releases the ring. A change
//! of geometry requires `teardown` followed by a fresh `setup`.

use super::comparator::{self, block_sum, fill_neutral, normalized_delta};
use super::config::{ChromaAddressing, ConfigError, MaskConfig};
use super::grid::BlockGrid;
use super::history::HistoryRing;
use super::stats::{MaskReport, MaskStats};
use crate::video::{FrameGeometry, PixelFormat, VideoFrame};
use std::collections::TryReserveError;
use thiserror::Error;

/// Errors raised by the masking stage.
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to allocate history ring of {slots} x {cells} sums: {source}")]
    Allocation {
        slots: usize,
        cells: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("mask stage not initialized")]
    NotInitialized,
    #[error("invalid stream geometry {0}")]
    InvalidGeometry(FrameGeometry),
    #[error("frame geometry {actual} does not match configured {expected}")]
    GeometryMismatch {
        expected: FrameGeometry,
        actual: FrameGeometry,
    },
    #[error("unsupported pixel format {0}: planar YUV required")]
    UnsupportedFormat(PixelFormat),
    #[error("halved chroma addressing cannot cover {0} chroma planes; use native addressing")]
    IncompatibleChroma(PixelFormat),
    #[error("frame {sequence} planes do not match its format")]
    InvalidFrame { sequence: u64 },
}

/// A stage in a frame pipeline that rewrites frames in place.
pub trait FrameTransformer {
    type Error;

    /// Prepares the stage for a stream of the given geometry.
    fn setup(&mut self, geometry: FrameGeometry) -> Result<(), Self::Error>;

    /// Transforms one frame and hands it back for downstream delivery.
    fn transform(&mut self, frame: VideoFrame) -> Result<VideoFrame, Self::Error>;

    /// Releases everything acquired in `setup`. Safe to call repeatedly.
    fn teardown(&mut self);
}

/// State that only exists while the stage is set up.
#[derive(Debug)]
struct ActiveState {
    geometry: FrameGeometry,
    grid: BlockGrid,
    history: HistoryRing,
    shift: (u32, u32),
}

/// Detects blocks unchanged since `frame_back` frames ago and blanks them.
///
/// The stage must be driven serially: the history ring is only correct if
/// frames arrive in order with no gaps, which `&mut self` enforces for a
/// single owner.
#[derive(Debug)]
pub struct StaticMask {
    config: MaskConfig,
    active: Option<ActiveState>,
    frame_index: u64,
    enabled: bool,
    stats: MaskStats,
}

impl StaticMask {
    /// Creates an unconfigured stage after validating `config`.
    pub fn new(config: MaskConfig) -> Result<Self, MaskError> {
        config.validate()?;
        Ok(Self {
            config,
            active: None,
            frame_index: 0,
            enabled: true,
            stats: MaskStats::default(),
        })
    }

    /// Resolves the block grid for `geometry` and allocates the history ring.
    ///
    /// Any previous setup is torn down first. On error the stage is left
    /// uninitialized.
    pub fn setup(&mut self, geometry: FrameGeometry) -> Result<(), MaskError> {
        self.teardown();

        let format = geometry.format;
        let native = format
            .chroma_shift()
            .ok_or(MaskError::UnsupportedFormat(format))?;
        if self.config.chroma == ChromaAddressing::Halved && (native.0 > 1 || native.1 > 1) {
            return Err(MaskError::IncompatibleChroma(format));
        }
        let shift = comparator::chroma_shift(format, self.config.chroma)
            .ok_or(MaskError::UnsupportedFormat(format))?;

        let grid = BlockGrid::resolve(
            geometry.width,
            geometry.height,
            self.config.block_size as usize,
        )
        .ok_or(MaskError::InvalidGeometry(geometry))?;

        let slots = self.config.frame_back as usize;
        let history =
            HistoryRing::allocate(slots, grid.cells()).map_err(|source| MaskError::Allocation {
                slots,
                cells: grid.cells(),
                source,
            })?;

        tracing::info!(
            geometry = %geometry,
            grid_width = grid.width(),
            grid_height = grid.height(),
            lookback = slots,
            history_bytes = history.memory_bytes(),
            chroma = ?self.config.chroma,
            "Static mask configured"
        );

        self.active = Some(ActiveState {
            geometry,
            grid,
            history,
            shift,
        });
        self.frame_index = 0;
        self.stats = MaskStats::default();
        Ok(())
    }

    /// Masks static blocks of `frame` in place.
    ///
    /// Each block's fingerprint is compared against the one recorded for
    /// the same cell `frame_back` frames earlier (zero until that many
    /// frames have been seen), blanked if the normalized delta is below
    /// the threshold, and then recorded for future comparison.
    pub fn process(&mut self, frame: &mut VideoFrame) -> Result<MaskReport, MaskError> {
        let active = self.active.as_mut().ok_or(MaskError::NotInitialized)?;

        if frame.geometry() != active.geometry {
            return Err(MaskError::GeometryMismatch {
                expected: active.geometry,
                actual: frame.geometry(),
            });
        }
        if !frame.is_valid() {
            return Err(MaskError::InvalidFrame {
                sequence: frame.sequence(),
            });
        }

        let grid = active.grid;
        if !self.enabled {
            let report = MaskReport {
                frame_index: self.frame_index,
                blocks_total: grid.cells(),
                blocks_masked: 0,
                bypassed: true,
            };
            self.stats.record(report);
            tracing::trace!(
                sequence = frame.sequence(),
                "Static mask disabled, frame passed through"
            );
            return Ok(report);
        }

        let slot = active.history.slot_index(self.frame_index);
        let block_size = grid.block_size();
        let threshold = self.config.threshold;
        let mut blocks_masked = 0;

        // Blocks are handled strictly in order: with odd block sizes a chroma
        // sample blanked by one block feeds into its neighbour's sum.
        for rect in grid.blocks() {
            let sum = block_sum(frame, &rect, active.shift).ok_or(MaskError::InvalidFrame {
                sequence: frame.sequence(),
            })?;
            let previous = active.history.get(slot, rect.cell).unwrap_or_default();
            let norm = normalized_delta(sum, previous, block_size);

            if comparator::is_static(norm, threshold) {
                tracing::trace!(cell = rect.cell, sum, previous, norm, "Block masked");
                fill_neutral(frame, &rect, active.shift).ok_or(MaskError::InvalidFrame {
                    sequence: frame.sequence(),
                })?;
                blocks_masked += 1;
            }

            active.history.record(slot, rect.cell, sum);
        }

        let report = MaskReport {
            frame_index: self.frame_index,
            blocks_total: grid.cells(),
            blocks_masked,
            bypassed: false,
        };
        self.frame_index += 1;
        self.stats.record(report);

        tracing::debug!(
            frame_index = report.frame_index,
            sequence = frame.sequence(),
            slot,
            masked = report.blocks_masked,
            total = report.blocks_total,
            "Frame masked"
        );

        Ok(report)
    }

    /// Releases the history ring. No-op if not set up.
    pub fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::info!(
                geometry = %active.geometry,
                frames = self.frame_index,
                "Static mask torn down"
            );
        }
        self.frame_index = 0;
    }

    /// Enables or disables masking. While disabled, frames pass through
    /// untouched and neither the history nor the frame index advance.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::info!(enabled, "Static mask toggled");
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    /// Number of frames processed since setup.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    pub fn geometry(&self) -> Option<FrameGeometry> {
        self.active.as_ref().map(|a| a.geometry)
    }

    pub fn grid(&self) -> Option<&BlockGrid> {
        self.active.as_ref().map(|a| &a.grid)
    }

    pub fn history(&self) -> Option<&HistoryRing> {
        self.active.as_ref().map(|a| &a.history)
    }

    /// Totals since the last setup.
    pub fn stats(&self) -> &MaskStats {
        &self.stats
    }
}

impl FrameTransformer for StaticMask {
    type Error = MaskError;

    fn setup(&mut self, geometry: FrameGeometry) -> Result<(), MaskError> {
        StaticMask::setup(self, geometry)
    }

    fn transform(&mut self, mut frame: VideoFrame) -> Result<VideoFrame, MaskError> {
        self.process(&mut frame)?;
        Ok(frame)
    }

    fn teardown(&mut self) {
        StaticMask::teardown(self)
    }
}
