use super::resolve;
use crate::context::DeviceContext;
use crate::native;
use crate::options::DescriptorSetAllocateOptions;
use handlewire_runtime::marshal::{alloc_output, count_of, marshal, record_mut};
use handlewire_runtime::{BridgeError, NativeHandle, NativeResult, Result, TierCell, Tiered};
use smallvec::SmallVec;
use std::sync::Arc;

pub struct DescriptorPool {
    handle: NativeHandle,
    context: Arc<DeviceContext>,
    tier: TierCell,
}

native_object!(DescriptorPool);

impl DescriptorPool {
    /// Allocate one descriptor set per layout with one native call
    pub fn allocate_descriptor_sets(
        &self,
        options: &DescriptorSetAllocateOptions,
    ) -> Result<(Vec<Arc<DescriptorSet>>, NativeResult)> {
        let count = options.set_layouts.len();
        let device = self.context.handle();
        let mut arena = self.context.arenas().acquire();

        let info = marshal(options, &mut arena)?;
        unsafe {
            record_mut::<native::DescriptorSetAllocateInfo>(info.cast()).descriptor_pool = self.handle;
        }
        let out = alloc_output::<NativeHandle>(&mut arena, count)?;

        let code = self.context.call("vkAllocateDescriptorSets", |driver| unsafe {
            driver.allocate_descriptor_sets(device, info.as_ptr().cast_const().cast(), out)
        })?;

        let handles = unsafe { std::slice::from_raw_parts(out, count) };
        let tier = self.tier();
        let sets = handles
            .iter()
            .map(|&handle| {
                resolve(&self.context, handle, tier, |context, handle| {
                    DescriptorSet::from_raw(context, handle, self.handle)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((sets, code))
    }

    /// Return descriptor sets to this pool; identity entries are kept
    pub fn free_descriptor_sets(&self, sets: &[Arc<DescriptorSet>]) -> Result<NativeResult> {
        if sets.is_empty() {
            return Ok(NativeResult::SUCCESS);
        }
        if let Some(stranger) = sets.iter().find(|set| set.pool != self.handle) {
            return Err(BridgeError::invalid_argument(format!(
                "descriptor set {} belongs to pool {}, not {}",
                stranger.handle, stranger.pool, self.handle
            )));
        }

        let handles: SmallVec<[NativeHandle; 8]> = sets.iter().map(|set| set.handle).collect();
        let count = count_of(&handles, "descriptor_sets")?;
        let device = self.context.handle();

        self.context.call("vkFreeDescriptorSets", |driver| unsafe {
            driver.free_descriptor_sets(device, self.handle, count, handles.as_ptr())
        })
    }

    pub fn forget_descriptor_sets(&self, sets: &[Arc<DescriptorSet>]) {
        for set in sets {
            self.context.store().forget(set.handle);
        }
    }
}

pub struct DescriptorSet {
    handle: NativeHandle,
    context: Arc<DeviceContext>,
    tier: TierCell,
    pool: NativeHandle,
}

native_object!(DescriptorSet, pool);

impl DescriptorSet {
    #[inline]
    pub fn pool(&self) -> NativeHandle {
        self.pool
    }
}
