//! Scratch arena - bump allocation for one marshal + call + read sequence
//!
//! Design: Three-layer architecture:
//! 1. Bump allocation inside the current block (fast path)
//! 2. Block chaining with doubling growth (slow path, amortized)
//! 3. Bulk release: one call invalidates every region, blocks are kept for reuse
//!
//! Validity is tracked with a generation counter: every `Region` remembers the
//! generation it was issued in, and `release_all` starts a new one. In debug
//! builds released memory is filled with `POISON_BYTE`.
//!
//! An arena is single-threaded. Concurrent calls use independent arenas,
//! usually handed out by an `ArenaPool`.

mod arena;
mod bump;
mod pool;


pub use arena::{Block, BlockList, BLOCK_ALIGN, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE};
pub use bump::BumpAllocator;
pub use pool::{ArenaPool, PooledArena};

use crate::config::ArenaConfig;
use crate::error::{BridgeError, Result};
use crate::logging::{log_arena_grow, log_arena_release};
use core::alloc::Layout;
use core::ptr::NonNull;

/// Sentinel written over released memory when poisoning is on
pub const POISON_BYTE: u8 = 0xDD;

/// A zero-initialized allocation handed out by an `Arena`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    ptr: NonNull<u8>,
    len: usize,
    generation: u64,
}

impl Region {
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_non_null(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Reinterpret the region start as a `T` pointer
    #[inline]
    pub fn cast<T>(&self) -> *mut T {
        self.ptr.as_ptr() as *mut T
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Arena generation this region belongs to
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Growable bump arena with bulk release
pub struct Arena {
    bump: BumpAllocator,
    blocks: BlockList,
    current: Option<usize>,
    offset: usize,
    peak: usize,
    generation: u64,
    poison: bool,
}

// Safety: the arena exclusively owns its blocks; the raw cursor only points into them
unsafe impl Send for Arena {}

impl Arena {
    /// Arena with default sizing; poisons on release in debug builds
    pub fn new() -> Self {
        Self::with_config(&ArenaConfig::default())
    }

    pub fn with_config(config: &ArenaConfig) -> Self {
        Self {
            bump: BumpAllocator::new(),
            blocks: BlockList::new(config.initial_block_size, config.max_block_size),
            current: None,
            offset: 0,
            peak: 0,
            generation: 0,
            poison: config.poison_on_release,
        }
    }

    /// Allocate `size` zeroed bytes aligned to `align`
    ///
    /// Grows instead of failing when the current block is exhausted; only a
    /// refused backing allocation surfaces as `OutOfMemory`.
    pub fn acquire(&mut self, size: usize, align: usize) -> Result<Region> {
        if !align.is_power_of_two() {
            return Err(BridgeError::invalid_argument(format!(
                "arena alignment {} is not a power of two",
                align
            )));
        }

        let (ptr, consumed) = match self.bump.try_alloc(size, align) {
            Some(hit) => hit,
            None => self.acquire_slow(size, align)?,
        };

        unsafe { core::ptr::write_bytes(ptr.as_ptr(), 0, size) };

        self.offset += consumed;
        self.peak = self.peak.max(self.offset);

        Ok(Region {
            ptr,
            len: size,
            generation: self.generation,
        })
    }

    /// Allocate room for one value of `layout`
    #[inline]
    pub fn acquire_layout(&mut self, layout: Layout) -> Result<Region> {
        self.acquire(layout.size(), layout.align())
    }

    /// Allocate a zeroed array of `count` `T`s
    pub fn acquire_array<T>(&mut self, count: usize) -> Result<Region> {
        let layout = Layout::array::<T>(count).map_err(|_| BridgeError::OutOfMemory {
            requested: count.saturating_mul(core::mem::size_of::<T>()),
        })?;
        self.acquire_layout(layout)
    }

    fn acquire_slow(&mut self, size: usize, align: usize) -> Result<(NonNull<u8>, usize)> {
        // Recycle blocks kept from earlier generations before growing
        let mut next = self.current.map_or(0, |index| index + 1);
        while let Some(block) = self.blocks.get(next) {
            if block.fits(size, align) {
                break;
            }
            next += 1;
        }

        if next >= self.blocks.len() {
            next = self
                .blocks
                .grow_with_min(size, align)
                .ok_or(BridgeError::OutOfMemory { requested: size })?;
            log_arena_grow(self.blocks.get(next).map_or(0, Block::size), self.blocks.len());
        }

        let (start, end) = self
            .blocks
            .get(next)
            .map(Block::bounds)
            .ok_or(BridgeError::OutOfMemory { requested: size })?;
        self.bump.reset(start, end);
        self.current = Some(next);

        self.bump
            .try_alloc(size, align)
            .ok_or(BridgeError::OutOfMemory { requested: size })
    }

    /// Invalidate every region issued so far
    ///
    /// Blocks are kept for the next generation. With poisoning on, every byte
    /// handed out is overwritten with `POISON_BYTE` first.
    pub fn release_all(&mut self) {
        let released = self.offset;

        if self.poison {
            if let Some(last) = self.current {
                for index in 0..=last {
                    if let Some(block) = self.blocks.get_mut(index) {
                        let size = block.size();
                        block.fill(size, POISON_BYTE);
                    }
                }
            }
        }

        self.bump.clear();
        self.current = None;
        self.offset = 0;
        self.generation += 1;

        log_arena_release(released, self.generation);
    }

    /// Bytes issued since the last release, alignment padding included
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `region` was issued in the current generation
    #[inline]
    pub fn is_live(&self, region: &Region) -> bool {
        region.generation == self.generation
    }

    /// Read back a region, rejecting stale ones
    pub fn bytes(&self, region: &Region) -> Result<&[u8]> {
        if !self.is_live(region) {
            return Err(BridgeError::invariant(format!(
                "region from arena generation {} read after release (current generation {})",
                region.generation, self.generation
            )));
        }
        Ok(unsafe { core::slice::from_raw_parts(region.ptr.as_ptr(), region.len) })
    }

    /// Arena statistics for monitoring and debugging
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            total_reserved: self.blocks.total_reserved(),
            bytes_in_use: self.offset,
            current_block_remaining: self.bump.remaining(),
            block_count: self.blocks.len(),
            generation: self.generation,
            peak_in_use: self.peak,
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Arena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("offset", &self.offset)
            .field("generation", &self.generation)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

/// Arena statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    pub total_reserved: usize,
    pub bytes_in_use: usize,
    pub current_block_remaining: usize,
    pub block_count: usize,
    pub generation: u64,
    pub peak_in_use: usize,
}
