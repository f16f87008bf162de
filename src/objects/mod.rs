//! Wrapper objects - one in-process object per live native handle
//!
//! Wrappers are only ever built inside an `IdentityStore::get_or_create`
//! factory, so two lookups of the same handle yield the same `Arc`. Each one
//! keeps the device context alive and carries a back-reference to its parent
//! pool where the native API needs it.

use crate::context::DeviceContext;
use handlewire_runtime::{CapabilityTier, NativeHandle, Result, Tiered};
use std::sync::Arc;

/// Implements `NativeObject`, `Tiered` and `Debug` for a wrapper struct
///
/// The struct has `handle`, `context` and `tier` fields plus any listed
/// parent handles, which are copied by `respawn`.
macro_rules! native_object {
    ($ty:ident $(, $parent:ident)*) => {
        impl $ty {
            pub(crate) fn from_raw(
                context: std::sync::Arc<$crate::context::DeviceContext>,
                handle: handlewire_runtime::NativeHandle,
                $($parent: handlewire_runtime::NativeHandle,)*
            ) -> Self {
                Self {
                    handle,
                    context,
                    tier: handlewire_runtime::TierCell::default(),
                    $($parent,)*
                }
            }
        }

        impl $crate::objects::NativeObject for $ty {
            #[inline]
            fn handle(&self) -> handlewire_runtime::NativeHandle {
                self.handle
            }

            #[inline]
            fn context(&self) -> &std::sync::Arc<$crate::context::DeviceContext> {
                &self.context
            }

            fn respawn(&self) -> Self {
                Self {
                    handle: self.handle,
                    context: std::sync::Arc::clone(&self.context),
                    tier: handlewire_runtime::TierCell::new(self.tier.get()),
                    $($parent: self.$parent,)*
                }
            }
        }

        impl handlewire_runtime::Tiered for $ty {
            #[inline]
            fn tier_cell(&self) -> &handlewire_runtime::TierCell {
                &self.tier
            }
        }

        impl core::fmt::Debug for $ty {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("handle", &self.handle)
                    .field("tier", &self.tier.get())
                    $(.field(stringify!($parent), &self.$parent))*
                    .finish()
            }
        }
    };
}

mod command;
mod descriptor;
mod memory;
mod queue;
mod sync;

pub use command::{CommandBuffer, CommandPool};
pub use descriptor::{DescriptorPool, DescriptorSet};
pub use memory::{DeviceMemory, MappedMemory};
pub use queue::Queue;
pub use sync::{Event, Fence};

/// A wrapper registered in its device's identity store
pub trait NativeObject: Tiered + Sized {
    fn handle(&self) -> NativeHandle;

    fn context(&self) -> &Arc<DeviceContext>;

    /// Unregistered copy of this wrapper, used as the store factory
    fn respawn(&self) -> Self;

    /// The registered wrapper for this handle viewed at `tier`
    ///
    /// Returns `None` when the device's API version does not reach `tier`.
    /// Under the promote policy the stored wrapper is raised in place, so
    /// every existing holder observes the new tier.
    fn promote(&self, tier: CapabilityTier) -> Result<Option<Arc<Self>>> {
        let context = self.context();
        if !context.api_version().is_at_least(tier.min_version()) {
            return Ok(None);
        }
        context
            .store()
            .get_or_create(self.handle(), tier, || self.respawn())
            .map(Some)
    }
}

/// Resolve a freshly returned handle through the device's store
pub(crate) fn resolve<T, F>(context: &Arc<DeviceContext>, handle: NativeHandle, tier: CapabilityTier, build: F) -> Result<Arc<T>>
where
    T: Tiered,
    F: FnOnce(Arc<DeviceContext>, NativeHandle) -> T,
{
    context
        .store()
        .get_or_create(handle, tier, || build(Arc::clone(context), handle))
}
