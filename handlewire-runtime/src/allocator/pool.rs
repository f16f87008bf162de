//! Arena pool - scoped acquisition with guaranteed release
//!
//! `acquire` hands out an arena behind a guard; dropping the guard releases
//! every region and returns the arena for reuse, on every exit path.

use super::Arena;
use crate::config::ArenaConfig;
use parking_lot::Mutex;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

/// Thread-safe pool of warm arenas
pub struct ArenaPool {
    arenas: Mutex<Vec<Arena>>,
    config: ArenaConfig,
}

impl ArenaPool {
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            arenas: Mutex::new(Vec::with_capacity(config.max_pooled)),
            config,
        }
    }

    /// Get an arena from the pool or create a new one
    pub fn acquire(&self) -> PooledArena<'_> {
        let arena = self
            .arenas
            .lock()
            .pop()
            .unwrap_or_else(|| Arena::with_config(&self.config));

        PooledArena {
            arena: ManuallyDrop::new(arena),
            pool: self,
        }
    }

    fn release(&self, mut arena: Arena) {
        arena.release_all();

        let mut arenas = self.arenas.lock();
        if arenas.len() < self.config.max_pooled {
            arenas.push(arena);
        }
        // Otherwise drop it
    }

    /// Arenas currently idle in the pool
    pub fn size(&self) -> usize {
        self.arenas.lock().len()
    }

    pub fn clear(&self) {
        self.arenas.lock().clear();
    }
}

impl Default for ArenaPool {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}

/// Arena on loan from an `ArenaPool`
pub struct PooledArena<'a> {
    arena: ManuallyDrop<Arena>,
    pool: &'a ArenaPool,
}

impl Deref for PooledArena<'_> {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        &self.arena
    }
}

impl DerefMut for PooledArena<'_> {
    fn deref_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }
}

impl Drop for PooledArena<'_> {
    fn drop(&mut self) {
        // Safety: the arena is taken exactly once, here
        let arena = unsafe { ManuallyDrop::take(&mut self.arena) };
        self.pool.release(arena);
    }
}
