//! Per-block fingerprinting, comparison and blanking.
//!
//! The fingerprint of a block is the plain sum of every luma sample in it
//! plus, for each luma pixel, the chroma U and V samples addressed from that
//! pixel. Chroma is therefore counted once per covering luma pixel (about
//! four times per sample for 4:2:0), not once per chroma sample.

use super::config::ChromaAddressing;
use super::grid::BlockRect;
use crate::video::{PixelFormat, VideoFrame};

/// Luma value written into static blocks.
pub const BLANK_LUMA: u8 = 16;
/// Chroma value written into static blocks.
pub const BLANK_CHROMA: u8 = 128;

/// Chroma coordinate shifts `(x, y)` for the addressing mode.
pub fn chroma_shift(format: PixelFormat, addressing: ChromaAddressing) -> Option<(u32, u32)> {
    match addressing {
        ChromaAddressing::Halved => format.is_planar_yuv().then_some((1, 1)),
        ChromaAddressing::Native => format.chroma_shift(),
    }
}

/// Sums the block's luma and per-pixel chroma samples.
///
/// Returns `None` if the block or a chroma index falls outside the frame.
pub fn block_sum(frame: &VideoFrame, rect: &BlockRect, shift: (u32, u32)) -> Option<u64> {
    let luma = frame.plane(0)?;
    let cb = frame.plane(1)?;
    let cr = frame.plane(2)?;
    let (sx, sy) = shift;

    let mut sum = 0u64;
    for j in rect.y..rect.y + rect.height {
        let y_row = luma.try_row(j)?.get(rect.x..rect.x + rect.width)?;
        let cb_row = cb.try_row(j >> sy)?;
        let cr_row = cr.try_row(j >> sy)?;

        for (i, &y) in (rect.x..).zip(y_row) {
            let ci = i >> sx;
            sum += u64::from(y) + u64::from(*cb_row.get(ci)?) + u64::from(*cr_row.get(ci)?);
        }
    }
    Some(sum)
}

/// Delta between two fingerprints, scaled by the nominal block area.
///
/// The divisor is `block_size² / 10` in integer arithmetic and the quotient
/// is truncated. Block sizes 1 to 3 truncate that divisor to zero; for them
/// the exact divisor (0.1, 0.4, 0.9) is used instead. Clipped edge blocks
/// are still scaled by the nominal area.
pub fn normalized_delta(sum: u64, previous: u64, block_size: usize) -> f64 {
    let delta = sum.abs_diff(previous);
    let nominal = (block_size as u64) * (block_size as u64);
    let divisor = nominal / 10;

    if divisor == 0 {
        delta as f64 * 10.0 / nominal as f64
    } else {
        (delta / divisor) as f64
    }
}

/// True when a block's normalized delta is strictly below the threshold.
#[inline]
pub fn is_static(norm: f64, threshold: f64) -> bool {
    norm < threshold
}

/// Overwrites the block with neutral values.
///
/// Every chroma sample addressed from a luma pixel of the block is blanked,
/// so with odd block sizes a shared chroma sample of the neighbouring block
/// is blanked too. Returns `None` if the block falls outside the frame.
pub fn fill_neutral(frame: &mut VideoFrame, rect: &BlockRect, shift: (u32, u32)) -> Option<()> {
    if rect.width == 0 || rect.height == 0 {
        return Some(());
    }
    let (sx, sy) = shift;
    let (luma, cb, cr) = frame.yuv_planes_mut()?;

    for j in rect.y..rect.y + rect.height {
        luma.try_row_mut(j)?
            .get_mut(rect.x..rect.x + rect.width)?
            .fill(BLANK_LUMA);
    }

    let columns = (rect.x >> sx)..=((rect.x + rect.width - 1) >> sx);
    let rows = (rect.y >> sy)..=((rect.y + rect.height - 1) >> sy);
    for cj in rows {
        for plane in [&mut *cb, &mut *cr] {
            plane
                .try_row_mut(cj)?
                .get_mut(columns.clone())?
                .fill(BLANK_CHROMA);
        }
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::grid::BlockGrid;

    fn filled(format: PixelFormat, width: usize, height: usize, y: u8, u: u8, v: u8) -> VideoFrame {
        let mut frame = VideoFrame::new(format, width, height, 0);
        for (index, value) in [(0, y), (1, u), (2, v)] {
            let plane = frame.plane_mut(index).unwrap();
            for row in 0..plane.height() {
                plane.row_mut(row).fill(value);
            }
        }
        frame
    }

    #[test]
    fn test_sum_counts_chroma_per_luma_pixel() {
        let frame = filled(PixelFormat::Yuv420p, 4, 4, 10, 1, 2);
        let grid = BlockGrid::resolve(4, 4, 2).unwrap();
        let rect = grid.block(0, 0).unwrap();

        // 4 pixels * (10 + 1 + 2)
        assert_eq!(block_sum(&frame, &rect, (1, 1)), Some(52));
    }

    #[test]
    fn test_sum_of_clipped_block_uses_visible_pixels() {
        let frame = filled(PixelFormat::Yuv420p, 5, 5, 1, 0, 0);
        let grid = BlockGrid::resolve(5, 5, 4).unwrap();
        let corner = grid.block(1, 1).unwrap();

        assert_eq!(corner.area(), 1);
        assert_eq!(block_sum(&frame, &corner, (1, 1)), Some(1));
    }

    #[test]
    fn test_halved_addressing_on_full_chroma() {
        let mut frame = filled(PixelFormat::Yuv444p, 4, 4, 0, 0, 0);
        frame.plane_mut(1).unwrap().set(1, 1, 5);
        let grid = BlockGrid::resolve(4, 4, 2).unwrap();

        // Halved: block (1,1) at luma (2..4, 2..4) reads chroma (1, 1).
        let rect = grid.block(1, 1).unwrap();
        assert_eq!(block_sum(&frame, &rect, (1, 1)), Some(20));
        // Native: the same block reads chroma (2..4, 2..4) and misses it.
        assert_eq!(block_sum(&frame, &rect, (0, 0)), Some(0));
    }

    #[test]
    fn test_normalized_delta_truncates() {
        // 20x20 block: divisor 40
        assert_eq!(normalized_delta(879, 0, 20), 21.0);
        assert_eq!(normalized_delta(0, 879, 20), 21.0);
        assert_eq!(normalized_delta(39, 0, 20), 0.0);
    }

    #[test]
    fn test_normalized_delta_small_blocks_use_exact_divisor() {
        assert_eq!(normalized_delta(2, 0, 2), 5.0);
        assert_eq!(normalized_delta(9, 0, 3), 10.0);
        assert!((normalized_delta(1, 0, 1) - 10.0).abs() < 1e-9);
        assert_eq!(normalized_delta(7, 7, 1), 0.0);
    }

    #[test]
    fn test_is_static_is_strict() {
        assert!(is_static(4.0, 5.0));
        assert!(!is_static(5.0, 5.0));
        assert!(!is_static(0.0, 0.0));
    }

    #[test]
    fn test_fill_neutral_limited_to_block() {
        let mut frame = filled(PixelFormat::Yuv420p, 8, 8, 200, 50, 60);
        let grid = BlockGrid::resolve(8, 8, 4).unwrap();
        let rect = grid.block(1, 0).unwrap();
        fill_neutral(&mut frame, &rect, (1, 1)).unwrap();

        let luma = frame.plane(0).unwrap();
        assert_eq!(luma.get(4, 0), Some(BLANK_LUMA));
        assert_eq!(luma.get(7, 3), Some(BLANK_LUMA));
        assert_eq!(luma.get(3, 0), Some(200));
        assert_eq!(luma.get(4, 4), Some(200));

        let cb = frame.plane(1).unwrap();
        assert_eq!(cb.get(2, 0), Some(BLANK_CHROMA));
        assert_eq!(cb.get(3, 1), Some(BLANK_CHROMA));
        assert_eq!(cb.get(1, 0), Some(50));
        assert_eq!(cb.get(2, 2), Some(50));
        assert_eq!(frame.plane(2).unwrap().get(3, 1), Some(BLANK_CHROMA));
    }

    #[test]
    fn test_fill_neutral_skips_alpha() {
        let mut frame = VideoFrame::new(PixelFormat::Yuva420p, 4, 4, 0);
        frame.plane_mut(3).unwrap().set(0, 0, 7);
        let grid = BlockGrid::resolve(4, 4, 4).unwrap();
        fill_neutral(&mut frame, &grid.block(0, 0).unwrap(), (1, 1)).unwrap();
        assert_eq!(frame.plane(3).unwrap().get(0, 0), Some(7));
    }

    #[test]
    fn test_chroma_shift_modes() {
        assert_eq!(
            chroma_shift(PixelFormat::Yuv444p, ChromaAddressing::Halved),
            Some((1, 1))
        );
        assert_eq!(
            chroma_shift(PixelFormat::Yuv444p, ChromaAddressing::Native),
            Some((0, 0))
        );
        assert_eq!(chroma_shift(PixelFormat::Rgba, ChromaAddressing::Halved), None);
    }
}
