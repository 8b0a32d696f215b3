//! Block grid over a frame.
//!
//! Blocks are `block_size` squares anchored at multiples of `block_size`;
//! the last block of each row and column is clipped to the frame edge.
//! Cells are numbered row-major, `row * width + col`.

/// A block's clipped extent in luma pixels and its cell number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub cell: usize,
}

impl BlockRect {
    /// Number of luma pixels covered.
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Block-grid dimensions resolved from frame size and block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    frame_width: usize,
    frame_height: usize,
    block_size: usize,
    width: usize,
    height: usize,
}

impl BlockGrid {
    /// Resolves the grid, rounding partial edge blocks up.
    ///
    /// Returns `None` if any dimension is zero.
    pub fn resolve(frame_width: usize, frame_height: usize, block_size: usize) -> Option<Self> {
        if frame_width == 0 || frame_height == 0 || block_size == 0 {
            return None;
        }
        Some(Self {
            frame_width,
            frame_height,
            block_size,
            width: frame_width.div_ceil(block_size),
            height: frame_height.div_ceil(block_size),
        })
    }

    /// Blocks per row.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Blocks per column.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total number of cells.
    #[inline]
    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Frame dimensions the grid was resolved for.
    #[inline]
    pub fn frame_size(&self) -> (usize, usize) {
        (self.frame_width, self.frame_height)
    }

    /// Cell number of the block whose origin is `(x, y)`.
    #[inline]
    pub fn cell_index(&self, x: usize, y: usize) -> usize {
        (y / self.block_size) * self.width + (x / self.block_size)
    }

    /// Clipped extent of block `(col, row)`.
    pub fn block(&self, col: usize, row: usize) -> Option<BlockRect> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let x = col * self.block_size;
        let y = row * self.block_size;
        Some(BlockRect {
            x,
            y,
            width: self.block_size.min(self.frame_width - x),
            height: self.block_size.min(self.frame_height - y),
            cell: self.cell_index(x, y),
        })
    }

    /// All blocks in row-major order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockRect> + '_ {
        (0..self.height)
            .flat_map(move |row| (0..self.width).filter_map(move |col| self.block(col, row)))
    }
}
