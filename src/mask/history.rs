//! Ring of per-block sums for the look-back window.
//!
//! Slot `n % K` is read and then overwritten while processing frame `n`,
//! so before the write it still holds the sums of frame `n - K`.

use std::collections::TryReserveError;

/// `K` slots of `cells` zero-initialised aggregate sums.
#[derive(Clone, PartialEq, Eq)]
pub struct HistoryRing {
    slots: Vec<Vec<u64>>,
    cells: usize,
}

impl HistoryRing {
    /// Allocates the ring.
    ///
    /// Uses fallible reservation so an oversized grid surfaces as an error
    /// instead of aborting. Slots reserved before a failure are released
    /// when the partial ring is dropped.
    pub fn allocate(lookback: usize, cells: usize) -> Result<Self, TryReserveError> {
        let mut slots: Vec<Vec<u64>> = Vec::new();
        slots.try_reserve_exact(lookback)?;
        for _ in 0..lookback {
            let mut slot = Vec::new();
            slot.try_reserve_exact(cells)?;
            slot.resize(cells, 0);
            slots.push(slot);
        }
        Ok(Self { slots, cells })
    }

    /// Number of slots (the look-back window).
    #[inline]
    pub fn lookback(&self) -> usize {
        self.slots.len()
    }

    /// Entries per slot.
    #[inline]
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Slot used while processing frame `frame_index`.
    #[inline]
    pub fn slot_index(&self, frame_index: u64) -> usize {
        (frame_index % self.slots.len() as u64) as usize
    }

    /// Sum stored for `cell` in `slot`.
    #[inline]
    pub fn get(&self, slot: usize, cell: usize) -> Option<u64> {
        self.slots.get(slot)?.get(cell).copied()
    }

    /// Overwrites the sum for `cell` in `slot`. Returns false if out of range.
    #[inline]
    pub fn record(&mut self, slot: usize, cell: usize, sum: u64) -> bool {
        match self.slots.get_mut(slot).and_then(|s| s.get_mut(cell)) {
            Some(entry) => {
                *entry = sum;
                true
            }
            None => false,
        }
    }

    /// Read access to a whole slot.
    pub fn slot(&self, slot: usize) -> Option<&[u64]> {
        self.slots.get(slot).map(Vec::as_slice)
    }

    /// Bytes held by the sum arrays.
    pub fn memory_bytes(&self) -> usize {
        self.slots.len() * self.cells * std::mem::size_of::<u64>()
    }
}

impl std::fmt::Debug for HistoryRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryRing")
            .field("lookback", &self.slots.len())
            .field("cells", &self.cells)
            .finish()
    }
}
