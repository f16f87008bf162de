//! Backing blocks - zero-initialized memory acquired from the global allocator
//!
//! Design: blocks are never moved or reallocated once handed out, so regions
//! issued from an earlier block stay valid while later blocks are chained in.

use std::alloc::{alloc_zeroed, dealloc, Layout};

/// Every block is aligned to this; larger alignments are handled by the bump cursor
pub const BLOCK_ALIGN: usize = 16;

/// Default size of the first block
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024;

/// Growth cap for later blocks (single oversized requests may still exceed it)
pub const MAX_BLOCK_SIZE: usize = 1024 * 1024;

/// One contiguous backing block
pub struct Block {
    start: *mut u8,
    layout: Layout,
}

// Safety: a block exclusively owns its memory
unsafe impl Send for Block {}

impl Block {
    /// Allocate a zeroed block, None if the allocator refuses or the size overflows
    pub fn new(size: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size.max(1), BLOCK_ALIGN).ok()?;

        let start = unsafe { alloc_zeroed(layout) };
        if start.is_null() {
            return None;
        }

        Some(Self { start, layout })
    }

    /// Block bounds for the bump allocator
    #[inline]
    pub fn bounds(&self) -> (*mut u8, *mut u8) {
        unsafe { (self.start, self.start.add(self.layout.size())) }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Overwrite the first `len` bytes with `byte`
    pub fn fill(&mut self, len: usize, byte: u8) {
        let len = len.min(self.size());
        unsafe { core::ptr::write_bytes(self.start, byte, len) }
    }

    /// Whether a request of `size` bytes at `align` is guaranteed to fit in a fresh cursor
    #[inline]
    pub fn fits(&self, size: usize, align: usize) -> bool {
        let padding = if align > BLOCK_ALIGN { align - BLOCK_ALIGN } else { 0 };
        size.checked_add(padding).map_or(false, |needed| needed <= self.size())
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.start, self.layout);
        }
    }
}

/// Ordered list of blocks with doubling growth
pub struct BlockList {
    blocks: Vec<Block>,
    next_size: usize,
    max_size: usize,
}

impl BlockList {
    pub fn new(initial_size: usize, max_size: usize) -> Self {
        Self {
            blocks: Vec::new(),
            next_size: initial_size.max(BLOCK_ALIGN),
            max_size: max_size.max(initial_size),
        }
    }

    /// Append a block large enough for `min` bytes at `align`
    ///
    /// Sizes double from block to block (capped at the configured maximum);
    /// an oversized request gets a block of exactly the size it needs.
    pub fn grow_with_min(&mut self, min: usize, align: usize) -> Option<usize> {
        let padding = if align > BLOCK_ALIGN { align - BLOCK_ALIGN } else { 0 };
        let needed = min.checked_add(padding)?;
        let size = self.next_size.max(needed);
        let block = Block::new(size)?;

        self.next_size = self.next_size.saturating_mul(2).min(self.max_size);
        self.blocks.push(block);
        Some(self.blocks.len() - 1)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total reserved memory across all blocks
    pub fn total_reserved(&self) -> usize {
        self.blocks.iter().map(Block::size).sum()
    }
}
