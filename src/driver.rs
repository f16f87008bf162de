//! Driver boundary - the native entry points this crate calls
//!
//! Pointers passed in are produced by the marshaler and stay valid for the
//! duration of the call only. Result codes are returned verbatim.

use crate::native::*;
use core::ffi::c_void;
use handlewire_runtime::{NativeBool, NativeHandle, NativeResult};

/// Loaded native entry points for one device
///
/// # Safety
/// Every method dereferences raw pointers supplied by the caller; callers
/// guarantee they point to valid records or arrays of the stated length.
pub trait Driver: Send + Sync {
    unsafe fn destroy_device(&self, device: NativeHandle);

    // ===== Synchronization =====

    unsafe fn create_fence(&self, device: NativeHandle, info: *const FenceCreateInfo, out: *mut NativeHandle) -> NativeResult;

    unsafe fn destroy_fence(&self, device: NativeHandle, fence: NativeHandle);

    unsafe fn get_fence_status(&self, device: NativeHandle, fence: NativeHandle) -> NativeResult;

    unsafe fn reset_fences(&self, device: NativeHandle, count: u32, fences: *const NativeHandle) -> NativeResult;

    unsafe fn wait_for_fences(
        &self,
        device: NativeHandle,
        count: u32,
        fences: *const NativeHandle,
        wait_all: NativeBool,
        timeout: u64,
    ) -> NativeResult;

    unsafe fn create_event(&self, device: NativeHandle, info: *const EventCreateInfo, out: *mut NativeHandle) -> NativeResult;

    unsafe fn destroy_event(&self, device: NativeHandle, event: NativeHandle);

    unsafe fn set_event(&self, device: NativeHandle, event: NativeHandle) -> NativeResult;

    unsafe fn reset_event(&self, device: NativeHandle, event: NativeHandle) -> NativeResult;

    unsafe fn get_event_status(&self, device: NativeHandle, event: NativeHandle) -> NativeResult;

    // ===== Queues =====

    unsafe fn get_device_queue(&self, device: NativeHandle, family: u32, index: u32, out: *mut NativeHandle);

    unsafe fn queue_submit(
        &self,
        queue: NativeHandle,
        count: u32,
        submits: *const SubmitInfo,
        fence: NativeHandle,
    ) -> NativeResult;

    // ===== Commands =====

    unsafe fn create_command_pool(
        &self,
        device: NativeHandle,
        info: *const CommandPoolCreateInfo,
        out: *mut NativeHandle,
    ) -> NativeResult;

    unsafe fn destroy_command_pool(&self, device: NativeHandle, pool: NativeHandle);

    unsafe fn allocate_command_buffers(
        &self,
        device: NativeHandle,
        info: *const CommandBufferAllocateInfo,
        out: *mut NativeHandle,
    ) -> NativeResult;

    unsafe fn free_command_buffers(&self, device: NativeHandle, pool: NativeHandle, count: u32, buffers: *const NativeHandle);

    unsafe fn begin_command_buffer(&self, buffer: NativeHandle, info: *const CommandBufferBeginInfo) -> NativeResult;

    unsafe fn end_command_buffer(&self, buffer: NativeHandle) -> NativeResult;

    unsafe fn cmd_clear_attachments(&self, buffer: NativeHandle, rect_count: u32, rects: *const ClearRect);

    // ===== Memory =====

    unsafe fn allocate_memory(&self, device: NativeHandle, info: *const MemoryAllocateInfo, out: *mut NativeHandle) -> NativeResult;

    unsafe fn free_memory(&self, device: NativeHandle, memory: NativeHandle);

    unsafe fn map_memory(
        &self,
        device: NativeHandle,
        memory: NativeHandle,
        offset: u64,
        size: u64,
        flags: u32,
        out: *mut *mut c_void,
    ) -> NativeResult;

    unsafe fn unmap_memory(&self, device: NativeHandle, memory: NativeHandle);

    // ===== Descriptors =====

    unsafe fn create_descriptor_pool(
        &self,
        device: NativeHandle,
        info: *const DescriptorPoolCreateInfo,
        out: *mut NativeHandle,
    ) -> NativeResult;

    unsafe fn destroy_descriptor_pool(&self, device: NativeHandle, pool: NativeHandle);

    unsafe fn allocate_descriptor_sets(
        &self,
        device: NativeHandle,
        info: *const DescriptorSetAllocateInfo,
        out: *mut NativeHandle,
    ) -> NativeResult;

    unsafe fn free_descriptor_sets(
        &self,
        device: NativeHandle,
        pool: NativeHandle,
        count: u32,
        sets: *const NativeHandle,
    ) -> NativeResult;

    // ===== Properties =====

    unsafe fn get_physical_device_properties2(&self, physical_device: NativeHandle, out: *mut PhysicalDeviceProperties2);

    /// With a null `out`, writes the family count; otherwise fills at most
    /// `*count` entries and writes back how many were filled
    unsafe fn get_physical_device_queue_family_properties(
        &self,
        physical_device: NativeHandle,
        count: *mut u32,
        out: *mut QueueFamilyProperties,
    );

    /// Same count-then-fill contract; `INCOMPLETE` when `*count` was too small
    unsafe fn enumerate_device_extension_properties(
        &self,
        physical_device: NativeHandle,
        count: *mut u32,
        out: *mut ExtensionProperties,
    ) -> NativeResult;
}
