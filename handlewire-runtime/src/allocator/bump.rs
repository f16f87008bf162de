//! Bump pointer allocation - O(1) fast path
//!
//! Design: one cursor moving forward through the current block. The cursor
//! never moves backwards except through `reset`, which is how the arena
//! hands it a fresh (or recycled) block.

use core::ptr::NonNull;

/// Bump allocator state - minimal overhead
pub struct BumpAllocator {
    start: *mut u8,
    current: *mut u8,
    end: *mut u8,
}

impl BumpAllocator {
    /// Create empty allocator (requires a block before the first allocation)
    #[inline]
    pub const fn new() -> Self {
        Self {
            start: core::ptr::null_mut(),
            current: core::ptr::null_mut(),
            end: core::ptr::null_mut(),
        }
    }

    /// Fast path: bump pointer allocation
    ///
    /// Returns the aligned pointer and the number of bytes the cursor moved
    /// (padding included), or None if the block is exhausted.
    #[inline(always)]
    pub fn try_alloc(&mut self, size: usize, align: usize) -> Option<(NonNull<u8>, usize)> {
        debug_assert!(align.is_power_of_two(), "alignment must be power of 2");

        if self.current.is_null() {
            return None;
        }

        let current = self.current as usize;
        let ptr = align_up(current, align)?;
        let new_current = ptr.checked_add(size)?;

        if new_current <= self.end as usize {
            self.current = new_current as *mut u8;
            NonNull::new(ptr as *mut u8).map(|p| (p, new_current - current))
        } else {
            None
        }
    }

    /// Point the cursor at a new block
    #[inline]
    pub fn reset(&mut self, start: *mut u8, end: *mut u8) {
        debug_assert!(start <= end, "invalid block bounds");
        self.start = start;
        self.current = start;
        self.end = end;
    }

    /// Detach from any block
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Bytes consumed in the current block
    #[inline]
    pub fn used(&self) -> usize {
        (self.current as usize).saturating_sub(self.start as usize)
    }

    /// Remaining capacity in current block
    #[inline]
    pub fn remaining(&self) -> usize {
        (self.end as usize).saturating_sub(self.current as usize)
    }
}

impl Default for BumpAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Align address upward to next multiple of alignment, None on overflow
#[inline(always)]
pub(crate) const fn align_up(addr: usize, align: usize) -> Option<usize> {
    match addr.checked_add(align - 1) {
        Some(bumped) => Some(bumped & !(align - 1)),
        None => None,
    }
}
