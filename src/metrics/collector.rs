//! Metrics collection and registry.

use crate::mask::{MaskStats, StaticMask};
use crate::video::FrameGeometry;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of stage state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frames run through the comparator.
    pub frames_processed: u64,
    /// Frames passed through while disabled.
    pub frames_bypassed: u64,
    /// Blocks examined.
    pub blocks_total: u64,
    /// Blocks blanked.
    pub blocks_masked: u64,
    /// Masked fraction of the most recent frame.
    pub last_masked_ratio: Option<f64>,
    /// Cells in the block grid (0 before setup).
    pub grid_cells: usize,
    /// Configured look-back window.
    pub lookback: u32,
    /// Whether the stage held a grid and history ring.
    pub initialized: bool,
    /// Whether masking was enabled or frames were passed through.
    pub enabled: bool,
    /// Frames processed since the last setup.
    pub frame_index: u64,
    /// Stream geometry the stage was set up for.
    pub geometry: Option<FrameGeometry>,
}

impl MetricsSnapshot {
    /// Creates a snapshot from the current state of the stage.
    pub fn from_stage(stage: &StaticMask) -> Self {
        let stats: &MaskStats = stage.stats();
        Self {
            frames_processed: stats.frames_processed,
            frames_bypassed: stats.frames_bypassed,
            blocks_total: stats.blocks_total,
            blocks_masked: stats.blocks_masked,
            last_masked_ratio: stats
                .last_report
                .filter(|r| !r.bypassed)
                .map(|r| r.masked_ratio()),
            grid_cells: stage.grid().map(|g| g.cells()).unwrap_or(0),
            lookback: stage.config().frame_back,
            initialized: stage.is_initialized(),
            enabled: stage.is_enabled(),
            frame_index: stage.frame_index(),
            geometry: stage.geometry(),
        }
    }
}

/// Prometheus metrics registry for the masking stage.
pub struct MetricsRegistry {
    registry: Registry,

    frames_processed: IntCounter,
    frames_bypassed: IntCounter,
    blocks_total: IntCounter,
    blocks_masked: IntCounter,
    masked_ratio: Gauge,
    grid_cells: IntGauge,
    lookback: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all stage metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_processed = IntCounter::new(
            "static_mask_frames_processed_total",
            "Frames run through the static block comparator",
        )?;
        let frames_bypassed = IntCounter::new(
            "static_mask_frames_bypassed_total",
            "Frames passed through while masking was disabled",
        )?;
        let blocks_total = IntCounter::new(
            "static_mask_blocks_total",
            "Blocks examined across all processed frames",
        )?;
        let blocks_masked = IntCounter::new(
            "static_mask_blocks_masked_total",
            "Blocks classified static and blanked",
        )?;
        let masked_ratio = Gauge::new(
            "static_mask_masked_ratio",
            "Fraction of blocks masked in the most recent frame",
        )?;
        let grid_cells = IntGauge::new("static_mask_grid_cells", "Cells in the block grid")?;
        let lookback = IntGauge::new(
            "static_mask_lookback_frames",
            "Number of frames looked back when comparing",
        )?;

        registry.register(Box::new(frames_processed.clone()))?;
        registry.register(Box::new(frames_bypassed.clone()))?;
        registry.register(Box::new(blocks_total.clone()))?;
        registry.register(Box::new(blocks_masked.clone()))?;
        registry.register(Box::new(masked_ratio.clone()))?;
        registry.register(Box::new(grid_cells.clone()))?;
        registry.register(Box::new(lookback.clone()))?;

        Ok(Self {
            registry,
            frames_processed,
            frames_bypassed,
            blocks_total,
            blocks_masked,
            masked_ratio,
            grid_cells,
            lookback,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward; apply the difference.
        advance(&self.frames_processed, snapshot.frames_processed);
        advance(&self.frames_bypassed, snapshot.frames_bypassed);
        advance(&self.blocks_total, snapshot.blocks_total);
        advance(&self.blocks_masked, snapshot.blocks_masked);

        if let Some(ratio) = snapshot.last_masked_ratio {
            self.masked_ratio.set(ratio);
        }
        self.grid_cells.set(snapshot.grid_cells as i64);
        self.lookback.set(i64::from(snapshot.lookback));
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::MaskConfig;
    use crate::video::{FrameGeometry, PixelFormat, VideoFrame};

    #[test]
    fn test_registry_creation() {
        assert!(MetricsRegistry::new().is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            frames_processed: 10,
            frames_bypassed: 1,
            blocks_total: 40,
            blocks_masked: 12,
            last_masked_ratio: Some(0.25),
            grid_cells: 4,
            lookback: 3,
            ..MetricsSnapshot::default()
        };
        registry.update(&snapshot);
        // Re-applying the same totals must not double count.
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("static_mask_frames_processed_total 10"));
        assert!(output.contains("static_mask_blocks_masked_total 12"));
        assert!(output.contains("static_mask_masked_ratio 0.25"));
        assert!(output.contains("static_mask_lookback_frames 3"));
    }

    #[test]
    fn test_snapshot_from_stage() {
        let mut stage = StaticMask::new(MaskConfig::new(2, 5.0, 2)).unwrap();
        stage
            .setup(FrameGeometry::new(4, 4, PixelFormat::Yuv420p))
            .unwrap();
        let mut frame = VideoFrame::new(PixelFormat::Yuv420p, 4, 4, 0);
        stage.process(&mut frame).unwrap();

        let snapshot = MetricsSnapshot::from_stage(&stage);
        assert_eq!(snapshot.frames_processed, 1);
        assert_eq!(snapshot.blocks_total, 4);
        assert_eq!(snapshot.grid_cells, 4);
        assert_eq!(snapshot.lookback, 2);
        assert!(snapshot.last_masked_ratio.is_some());
        assert!(snapshot.initialized && snapshot.enabled);
        assert_eq!(snapshot.frame_index, 1);
        assert_eq!(snapshot.geometry.map(|g| g.width), Some(4));

        stage.teardown();
        let snapshot = MetricsSnapshot::from_stage(&stage);
        assert!(!snapshot.initialized);
        assert_eq!(snapshot.geometry, None);
    }
}
