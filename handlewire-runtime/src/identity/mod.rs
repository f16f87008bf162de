//! Object identity - native handles to unique in-process wrappers
//!
//! Design: Two pieces:
//! 1. `IdentityStore`: the single point of truth for "is this the same
//!    resource". Owned by a context object, never a process global.
//! 2. Capability tiers: each wrapper carries a `TierCell`; requesting a
//!    handle at a higher tier promotes the stored wrapper in place
//!    (`TierPolicy::Promote`) or is rejected (`TierPolicy::Strict`).

mod store;
mod tier;

pub use store::IdentityStore;
pub use tier::{ApiVersion, CapabilityTier, TierCell, TierPolicy};

pub use crate::marshal::NativeHandle;

use std::any::Any;

/// A wrapper object the identity store can hold
pub trait Tiered: Any + Send + Sync {
    fn tier_cell(&self) -> &TierCell;

    #[inline]
    fn tier(&self) -> CapabilityTier {
        self.tier_cell().get()
    }

    #[inline]
    fn supports(&self, tier: CapabilityTier) -> bool {
        self.tier_cell().supports(tier)
    }
}
