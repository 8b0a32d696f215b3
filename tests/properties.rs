//! Property tests for grid tiling and mask decisions.

use proptest::prelude::*;
use static_mask::mask::{
    block_sum, normalized_delta, BlockGrid, MaskConfig, StaticMask, BLANK_CHROMA, BLANK_LUMA,
};
use static_mask::video::{FrameGeometry, PixelFormat, VideoFrame};

/// Builds a 4:2:0 frame from a seed so that shrinking stays meaningful.
fn seeded_frame(width: usize, height: usize, seed: u64) -> VideoFrame {
    let mut frame = VideoFrame::new(PixelFormat::Yuv420p, width, height, 0);
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    for index in 0..3 {
        let plane = frame.plane_mut(index).unwrap();
        for y in 0..plane.height() {
            for value in plane.row_mut(y) {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                *value = (state >> 56) as u8;
            }
        }
    }
    frame
}

/// Copies `src` into `dst` inside every block whose cell is in `keep`.
fn splice_blocks(dst: &mut VideoFrame, src: &VideoFrame, grid: &BlockGrid, keep: &[bool]) {
    for rect in grid.blocks().filter(|r| keep[r.cell]) {
        for j in rect.y..rect.y + rect.height {
            for i in rect.x..rect.x + rect.width {
                let value = src.plane(0).unwrap().get(i, j).unwrap();
                dst.plane_mut(0).unwrap().set(i, j, value);
                for index in [1, 2] {
                    let value = src.plane(index).unwrap().get(i / 2, j / 2).unwrap();
                    dst.plane_mut(index).unwrap().set(i / 2, j / 2, value);
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn blocks_tile_frame(width in 1usize..80, height in 1usize..80, size in 1usize..24) {
        let grid = BlockGrid::resolve(width, height, size).unwrap();
        let mut covered = vec![0u8; width * height];

        for rect in grid.blocks() {
            prop_assert!(rect.x + rect.width <= width);
            prop_assert!(rect.y + rect.height <= height);
            prop_assert_eq!(rect.cell, grid.cell_index(rect.x, rect.y));
            for j in rect.y..rect.y + rect.height {
                for i in rect.x..rect.x + rect.width {
                    covered[j * width + i] += 1;
                }
            }
        }

        prop_assert!(covered.iter().all(|&c| c == 1));
        prop_assert_eq!(grid.blocks().count(), grid.cells());
    }

    #[test]
    fn static_blocks_blank_and_others_untouched(
        width in 2usize..40,
        height in 2usize..40,
        half_size in 1usize..5,
        threshold in 0.0f64..50.0,
        seed_a in any::<u64>(),
        seed_b in any::<u64>(),
        keep in prop::collection::vec(any::<bool>(), 400),
    ) {
        let size = half_size * 2;
        let geometry = FrameGeometry::new(width, height, PixelFormat::Yuv420p);
        let grid = BlockGrid::resolve(width, height, size).unwrap();

        let first = seeded_frame(width, height, seed_a);
        let mut second = seeded_frame(width, height, seed_b);
        splice_blocks(&mut second, &first, &grid, &keep);

        let mut mask = StaticMask::new(MaskConfig::new(size as u32, threshold, 1)).unwrap();
        mask.setup(geometry).unwrap();
        mask.process(&mut first.clone()).unwrap();

        let input = second.clone();
        let report = mask.process(&mut second).unwrap();

        let mut expected_masked = 0;
        for rect in grid.blocks() {
            let before = block_sum(&first, &rect, (1, 1)).unwrap();
            let now = block_sum(&input, &rect, (1, 1)).unwrap();
            let masked = normalized_delta(now, before, size) < threshold;
            expected_masked += usize::from(masked);

            for j in rect.y..rect.y + rect.height {
                for i in rect.x..rect.x + rect.width {
                    let luma = second.plane(0).unwrap().get(i, j).unwrap();
                    let cb = second.plane(1).unwrap().get(i / 2, j / 2).unwrap();
                    let cr = second.plane(2).unwrap().get(i / 2, j / 2).unwrap();
                    if masked {
                        prop_assert_eq!((luma, cb, cr), (BLANK_LUMA, BLANK_CHROMA, BLANK_CHROMA));
                    } else {
                        prop_assert_eq!(luma, input.plane(0).unwrap().get(i, j).unwrap());
                        prop_assert_eq!(cb, input.plane(1).unwrap().get(i / 2, j / 2).unwrap());
                        prop_assert_eq!(cr, input.plane(2).unwrap().get(i / 2, j / 2).unwrap());
                    }
                }
            }
        }
        prop_assert_eq!(report.blocks_masked, expected_masked);
    }

    #[test]
    fn history_holds_pre_mask_sums(
        width in 1usize..40,
        height in 1usize..40,
        size in 2usize..12,
        lookback in 1u32..5,
        frames in 1usize..8,
        seed in any::<u64>(),
    ) {
        let geometry = FrameGeometry::new(width, height, PixelFormat::Yuv420p);
        let mut mask = StaticMask::new(MaskConfig::new(size as u32, 1000.0, lookback)).unwrap();
        mask.setup(geometry).unwrap();

        for n in 0..frames {
            let input = seeded_frame(width, height, seed.wrapping_add(n as u64 % 2));
            let mut frame = input.clone();
            mask.process(&mut frame).unwrap();

            // With even block sizes no chroma sample is shared between blocks,
            // so sums over the untouched input match what was recorded.
            if size % 2 == 0 {
                let ring = mask.history().unwrap();
                let slot = ring.slot_index(n as u64);
                let grid = mask.grid().unwrap();
                for rect in grid.blocks() {
                    let sum = block_sum(&input, &rect, (1, 1)).unwrap();
                    prop_assert_eq!(ring.get(slot, rect.cell), Some(sum));
                }
            }
        }
        prop_assert_eq!(mask.frame_index(), frames as u64);
    }
}
