//! Identity store - one wrapper per native handle
//!
//! Design: sharded map keyed by handle. `get_or_create` runs under the
//! entry's shard lock, so racing resolutions of one handle see either the
//! existing wrapper or the single one their factory call produced.

use super::tier::{CapabilityTier, TierPolicy};
use super::Tiered;
use crate::config::IdentityConfig;
use crate::error::{BridgeError, Result};
use crate::logging::{log_identity_create, log_identity_forget, log_identity_promote};
use crate::marshal::NativeHandle;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

struct Slot {
    object: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Handle → wrapper map owned by one instance or device context
pub struct IdentityStore {
    entries: DashMap<NativeHandle, Slot>,
    policy: TierPolicy,
}

impl IdentityStore {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            entries: DashMap::with_capacity(config.initial_capacity),
            policy: config.tier_policy,
        }
    }

    pub fn with_policy(policy: TierPolicy) -> Self {
        Self::new(&IdentityConfig {
            tier_policy: policy,
            ..IdentityConfig::default()
        })
    }

    #[inline]
    pub fn policy(&self) -> TierPolicy {
        self.policy
    }

    /// Resolve `handle` to its wrapper, constructing it on first observation
    ///
    /// `factory` runs at most once per handle, while the handle's shard is
    /// locked; it must not call back into this store. An existing wrapper is
    /// returned as is, promoted to `tier` when the policy allows it.
    pub fn get_or_create<T, F>(&self, handle: NativeHandle, tier: CapabilityTier, factory: F) -> Result<Arc<T>>
    where
        T: Tiered,
        F: FnOnce() -> T,
    {
        if handle.is_null() {
            return Err(BridgeError::invalid_argument(format!(
                "cannot resolve a null {} handle",
                std::any::type_name::<T>()
            )));
        }

        match self.entries.entry(handle) {
            Entry::Occupied(entry) => {
                let slot = entry.get();
                let object = Arc::clone(&slot.object).downcast::<T>().map_err(|_| {
                    BridgeError::invariant(format!(
                        "handle {} is already wrapped as {}, requested {}",
                        handle,
                        slot.type_name,
                        std::any::type_name::<T>()
                    ))
                })?;
                self.apply_tier(handle, object.as_ref(), tier)?;
                Ok(object)
            }
            Entry::Vacant(entry) => {
                let object = Arc::new(factory());
                object.tier_cell().raise(tier);

                let type_name = std::any::type_name::<T>();
                log_identity_create(handle.raw(), object.tier().as_str(), type_name);

                entry.insert(Slot {
                    object: Arc::clone(&object) as Arc<dyn Any + Send + Sync>,
                    type_name,
                });
                Ok(object)
            }
        }
    }

    fn apply_tier<T: Tiered>(&self, handle: NativeHandle, object: &T, tier: CapabilityTier) -> Result<()> {
        let current = object.tier();
        match self.policy {
            TierPolicy::Promote if tier > current => {
                object.tier_cell().raise(tier);
                log_identity_promote(handle.raw(), current.as_str(), tier.as_str());
                Ok(())
            }
            TierPolicy::Promote => Ok(()),
            TierPolicy::Strict if tier == current => Ok(()),
            TierPolicy::Strict => Err(BridgeError::invariant(format!(
                "handle {} is registered at tier {}, requested {}",
                handle, current, tier
            ))),
        }
    }

    /// Existing wrapper for `handle`, if it is registered as a `T`
    pub fn get<T: Tiered>(&self, handle: NativeHandle) -> Option<Arc<T>> {
        let slot = self.entries.get(&handle)?;
        Arc::clone(&slot.object).downcast::<T>().ok()
    }

    #[inline]
    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Drop the wrapper for a natively destroyed handle
    ///
    /// Returns whether the handle was registered.
    pub fn forget(&self, handle: NativeHandle) -> bool {
        let existed = self.entries.remove(&handle).is_some();
        log_identity_forget(handle.raw(), existed);
        existed
    }

    /// Drop every entry (context teardown)
    pub fn clear(&self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new(&IdentityConfig::default())
    }
}

impl core::fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityStore")
            .field("entries", &self.entries.len())
            .field("policy", &self.policy)
            .finish()
    }
}
