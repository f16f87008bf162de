//! Logical device - entry point for every wrapper this crate hands out
//!
//! A `Device` owns the shared `DeviceContext`. Creation calls marshal their
//! options into a pooled arena, make one native call and resolve the returned
//! handle through the identity store; destroy calls make the native call and
//! then `forget` the handle so a recycled value never resolves to a stale
//! wrapper.

use crate::context::DeviceContext;
use crate::driver::Driver;
use crate::native;
use crate::objects::{resolve, CommandPool, DescriptorPool, DeviceMemory, Event, Fence, NativeObject, Queue};
use crate::options::{
    CommandPoolCreateOptions, DescriptorPoolCreateOptions, DeviceProperties, EventCreateOptions, ExtensionProperties,
    FenceCreateOptions, MemoryAllocateOptions, QueueFamily,
};
use handlewire_runtime::marshal::{alloc_output, count_of, marshal, populate};
use handlewire_runtime::{
    ApiVersion, BridgeConfig, BridgeError, NativeBool, NativeHandle, NativeResult, Options, Result,
};
use smallvec::SmallVec;
use std::sync::Arc;
use std::{ptr, slice};
use tracing::{debug, info};

/// Wrappers keep the context alive through an `Arc`, and the store keeps
/// the wrappers; `destroy` and `Drop` clear the store to break that cycle.
pub struct Device {
    context: Arc<DeviceContext>,
}

impl Device {
    pub fn new(driver: Arc<dyn Driver>, handle: NativeHandle, api_version: ApiVersion, config: &BridgeConfig) -> Self {
        let context = Arc::new(DeviceContext::new(driver, handle, api_version, config));
        info!(target: "native", device = handle.raw(), api_version = %api_version, tier = %context.tier(), "device opened");
        Self { context }
    }

    #[inline]
    pub fn handle(&self) -> NativeHandle {
        self.context.handle()
    }

    #[inline]
    pub fn api_version(&self) -> ApiVersion {
        self.context.api_version()
    }

    #[inline]
    pub fn context(&self) -> &Arc<DeviceContext> {
        &self.context
    }

    /// Marshal `options`, run a create entry point, resolve the new handle
    fn create<T, C, B>(&self, function: &'static str, options: &dyn Options, create: C, build: B) -> Result<(Arc<T>, NativeResult)>
    where
        T: NativeObject,
        C: FnOnce(&dyn Driver, *const core::ffi::c_void, *mut NativeHandle) -> NativeResult,
        B: FnOnce(Arc<DeviceContext>, NativeHandle) -> T,
    {
        let mut arena = self.context.arenas().acquire();
        let info = marshal(options, &mut arena)?;

        let mut handle = NativeHandle::NULL;
        let code = self
            .context
            .call(function, |driver| create(driver, info.as_ptr().cast_const(), &mut handle))?;

        let object = resolve(&self.context, handle, self.context.tier(), build)?;
        Ok((object, code))
    }

    // ===== Synchronization =====

    pub fn create_fence(&self, options: &FenceCreateOptions) -> Result<(Arc<Fence>, NativeResult)> {
        let device = self.handle();
        self.create(
            "vkCreateFence",
            options,
            |driver, info, out| unsafe { driver.create_fence(device, info.cast(), out) },
            Fence::from_raw,
        )
    }

    pub fn destroy_fence(&self, fence: &Fence) {
        let device = self.handle();
        self.context
            .call_void("vkDestroyFence", |driver| unsafe { driver.destroy_fence(device, fence.handle()) });
        self.context.store().forget(fence.handle());
    }

    pub fn create_event(&self, options: &EventCreateOptions) -> Result<(Arc<Event>, NativeResult)> {
        let device = self.handle();
        self.create(
            "vkCreateEvent",
            options,
            |driver, info, out| unsafe { driver.create_event(device, info.cast(), out) },
            Event::from_raw,
        )
    }

    pub fn destroy_event(&self, event: &Event) {
        let device = self.handle();
        self.context
            .call_void("vkDestroyEvent", |driver| unsafe { driver.destroy_event(device, event.handle()) });
        self.context.store().forget(event.handle());
    }

    /// Wait on `fences`; the timeout in nanoseconds reaches the driver unchanged
    ///
    /// `TIMEOUT` is a success code and is returned, not raised.
    pub fn wait_for_fences(&self, fences: &[Arc<Fence>], wait_all: bool, timeout: u64) -> Result<NativeResult> {
        if fences.is_empty() {
            return Err(BridgeError::invalid_argument("attempted to wait on an empty fence list"));
        }
        let handles: SmallVec<[NativeHandle; 8]> = fences.iter().map(|fence| fence.handle()).collect();
        let count = count_of(&handles, "fences")?;
        let device = self.handle();

        self.context.call("vkWaitForFences", |driver| unsafe {
            driver.wait_for_fences(device, count, handles.as_ptr(), NativeBool::from(wait_all), timeout)
        })
    }

    pub fn reset_fences(&self, fences: &[Arc<Fence>]) -> Result<NativeResult> {
        if fences.is_empty() {
            return Ok(NativeResult::SUCCESS);
        }
        let handles: SmallVec<[NativeHandle; 8]> = fences.iter().map(|fence| fence.handle()).collect();
        let count = count_of(&handles, "fences")?;
        let device = self.handle();

        self.context
            .call("vkResetFences", |driver| unsafe { driver.reset_fences(device, count, handles.as_ptr()) })
    }

    // ===== Queues =====

    /// The queue at `index` within `family`
    pub fn queue(&self, family: u32, index: u32) -> Result<Arc<Queue>> {
        let device = self.handle();
        let mut handle = NativeHandle::NULL;
        self.context.call_void("vkGetDeviceQueue", |driver| unsafe {
            driver.get_device_queue(device, family, index, &mut handle)
        });
        resolve(&self.context, handle, self.context.tier(), Queue::from_raw)
    }

    // ===== Commands =====

    pub fn create_command_pool(&self, options: &CommandPoolCreateOptions) -> Result<(Arc<CommandPool>, NativeResult)> {
        let device = self.handle();
        self.create(
            "vkCreateCommandPool",
            options,
            |driver, info, out| unsafe { driver.create_command_pool(device, info.cast(), out) },
            CommandPool::from_raw,
        )
    }

    /// Destroying a pool frees its buffers natively; their wrappers are the
    /// caller's to forget through `CommandPool::forget_command_buffers`.
    pub fn destroy_command_pool(&self, pool: &CommandPool) {
        let device = self.handle();
        self.context.call_void("vkDestroyCommandPool", |driver| unsafe {
            driver.destroy_command_pool(device, pool.handle())
        });
        self.context.store().forget(pool.handle());
    }

    // ===== Memory =====

    pub fn allocate_memory(&self, options: &MemoryAllocateOptions) -> Result<(Arc<DeviceMemory>, NativeResult)> {
        let device = self.handle();
        self.create(
            "vkAllocateMemory",
            options,
            |driver, info, out| unsafe { driver.allocate_memory(device, info.cast(), out) },
            DeviceMemory::from_raw,
        )
    }

    pub fn free_memory(&self, memory: &DeviceMemory) {
        let device = self.handle();
        self.context
            .call_void("vkFreeMemory", |driver| unsafe { driver.free_memory(device, memory.handle()) });
        self.context.store().forget(memory.handle());
    }

    // ===== Descriptors =====

    pub fn create_descriptor_pool(
        &self,
        options: &DescriptorPoolCreateOptions,
    ) -> Result<(Arc<DescriptorPool>, NativeResult)> {
        let device = self.handle();
        self.create(
            "vkCreateDescriptorPool",
            options,
            |driver, info, out| unsafe { driver.create_descriptor_pool(device, info.cast(), out) },
            DescriptorPool::from_raw,
        )
    }

    pub fn destroy_descriptor_pool(&self, pool: &DescriptorPool) {
        let device = self.handle();
        self.context.call_void("vkDestroyDescriptorPool", |driver| unsafe {
            driver.destroy_descriptor_pool(device, pool.handle())
        });
        self.context.store().forget(pool.handle());
    }

    // ===== Properties =====

    /// Fill `properties` and every output extension chained to it
    pub fn physical_device_properties(&self, physical_device: NativeHandle, properties: &mut DeviceProperties) -> Result<()> {
        let mut arena = self.context.arenas().acquire();
        let record = marshal(&*properties, &mut arena)?;

        self.context.call_void("vkGetPhysicalDeviceProperties2", |driver| unsafe {
            driver.get_physical_device_properties2(physical_device, record.as_ptr().cast::<native::PhysicalDeviceProperties2>())
        });

        unsafe { populate(properties, record.as_ptr().cast_const()) }
    }

    /// Queue families of `physical_device`, in driver order
    pub fn queue_family_properties(&self, physical_device: NativeHandle) -> Result<Vec<QueueFamily>> {
        let (families, _) = self.enumerate(
            "vkGetPhysicalDeviceQueueFamilyProperties",
            |driver, count, out: *mut native::QueueFamilyProperties| {
                unsafe { driver.get_physical_device_queue_family_properties(physical_device, count, out) };
                NativeResult::SUCCESS
            },
            QueueFamily::from,
        )?;
        Ok(families)
    }

    /// Device extensions of `physical_device`
    ///
    /// `INCOMPLETE` from the fill call is returned alongside the entries
    /// that were written.
    pub fn device_extension_properties(
        &self,
        physical_device: NativeHandle,
    ) -> Result<(Vec<ExtensionProperties>, NativeResult)> {
        self.enumerate(
            "vkEnumerateDeviceExtensionProperties",
            |driver, count, out: *mut native::ExtensionProperties| unsafe {
                driver.enumerate_device_extension_properties(physical_device, count, out)
            },
            ExtensionProperties::from,
        )
    }

    /// Count-then-fill: a first call with a null array reports the count, a
    /// second fills an arena array of that many records
    fn enumerate<N, O, Q, C>(&self, function: &'static str, mut query: Q, convert: C) -> Result<(Vec<O>, NativeResult)>
    where
        N: Copy,
        Q: FnMut(&dyn Driver, *mut u32, *mut N) -> NativeResult,
        C: FnMut(N) -> O,
    {
        let mut count = 0u32;
        let code = self
            .context
            .call(function, |driver| query(driver, &mut count as *mut u32, ptr::null_mut()))?;
        if count == 0 {
            return Ok((Vec::new(), code));
        }

        let capacity = count;
        let mut arena = self.context.arenas().acquire();
        let records = alloc_output::<N>(&mut arena, capacity as usize)?;
        let code = self.context.call(function, |driver| query(driver, &mut count as *mut u32, records))?;

        // The fill call may write fewer records than first reported
        let filled = count.min(capacity) as usize;
        debug!(target: "native", function, reported = capacity, filled, "enumerated");
        // Safety: `records` holds `capacity` zeroed records, `filled` of them written
        let records = unsafe { slice::from_raw_parts(records.cast_const(), filled) };
        Ok((records.iter().copied().map(convert).collect(), code))
    }

    /// Destroy the native device and drop every registered wrapper
    pub fn destroy(self) {
        let device = self.handle();
        self.context
            .call_void("vkDestroyDevice", |driver| unsafe { driver.destroy_device(device) });
        // Drop clears the store
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        debug!(target: "identity", device = self.handle().raw(), entries = self.context.store().len(), "clearing identity store");
        self.context.store().clear();
        self.context.arenas().clear();
    }
}

impl core::fmt::Debug for Device {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device").field("context", &self.context).finish()
    }
}
