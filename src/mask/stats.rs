//! Per-frame reports and running totals.

/// Outcome of masking one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaskReport {
    /// Index the frame was processed at (before the counter advanced).
    pub frame_index: u64,
    /// Blocks in the grid.
    pub blocks_total: usize,
    /// Blocks classified static and blanked.
    pub blocks_masked: usize,
    /// True if the stage was disabled and the frame passed through.
    pub bypassed: bool,
}

impl MaskReport {
    /// Fraction of blocks masked, 0.0 for an empty grid.
    pub fn masked_ratio(&self) -> f64 {
        if self.blocks_total == 0 {
            return 0.0;
        }
        self.blocks_masked as f64 / self.blocks_total as f64
    }
}

/// Totals across every frame handed to the stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskStats {
    /// Frames run through the comparator.
    pub frames_processed: u64,
    /// Frames passed through while the stage was disabled.
    pub frames_bypassed: u64,
    /// Blocks examined across all processed frames.
    pub blocks_total: u64,
    /// Blocks blanked across all processed frames.
    pub blocks_masked: u64,
    /// Most recent report.
    pub last_report: Option<MaskReport>,
}

impl MaskStats {
    /// Folds one frame's report into the totals.
    pub fn record(&mut self, report: MaskReport) {
        if report.bypassed {
            self.frames_bypassed += 1;
        } else {
            self.frames_processed += 1;
            self.blocks_total += report.blocks_total as u64;
            self.blocks_masked += report.blocks_masked as u64;
        }
        self.last_report = Some(report);
    }

    /// Fraction of all examined blocks that were masked.
    pub fn masked_ratio(&self) -> f64 {
        if self.blocks_total == 0 {
            return 0.0;
        }
        self.blocks_masked as f64 / self.blocks_total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = MaskStats::default();
        assert_eq!(stats.masked_ratio(), 0.0);
        assert!(stats.last_report.is_none());
    }

    #[test]
    fn test_record_accumulates() {
        let mut stats = MaskStats::default();
        stats.record(MaskReport {
            frame_index: 0,
            blocks_total: 4,
            blocks_masked: 1,
            bypassed: false,
        });
        stats.record(MaskReport {
            frame_index: 1,
            blocks_total: 4,
            blocks_masked: 3,
            bypassed: false,
        });

        assert_eq!(stats.frames_processed, 2);
        assert_eq!(stats.blocks_masked, 4);
        assert_eq!(stats.masked_ratio(), 0.5);
        assert_eq!(stats.last_report.unwrap().masked_ratio(), 0.75);
    }

    #[test]
    fn test_bypassed_frames_not_counted_as_blocks() {
        let mut stats = MaskStats::default();
        stats.record(MaskReport {
            frame_index: 0,
            bypassed: true,
            ..Default::default()
        });

        assert_eq!(stats.frames_bypassed, 1);
        assert_eq!(stats.frames_processed, 0);
        assert_eq!(stats.blocks_total, 0);
    }
}
