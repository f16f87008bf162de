//! Handlewire Runtime - marshaling and identity core for handle-based native APIs
//!
//! This crate provides the pieces every native call site is built from:
//! scratch arenas for call-scoped memory, the extension-chain marshaler, and
//! the handle → wrapper identity store.

pub mod allocator;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod marshal;

// Re-export core types
pub use allocator::{Arena, ArenaPool, ArenaStats, PooledArena, Region};
pub use config::{ArenaConfig, BridgeConfig, IdentityConfig, LoggingConfig};
pub use error::{BridgeError, NativeResult, Result};
pub use identity::{ApiVersion, CapabilityTier, IdentityStore, TierCell, TierPolicy, Tiered};
pub use marshal::{NativeBool, NativeHandle, Next, Options, PlainRecord, StructureType};
