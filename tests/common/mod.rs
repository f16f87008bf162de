//! Recording stub driver shared by the integration tests
//!
//! Hands out sequential handles, decodes every record it receives into plain
//! Rust values, and answers property queries with fixed data.

#![allow(dead_code)]

use handlewire::native::*;
use handlewire::runtime::marshal::{chain_tags, BaseOutStructure};
use handlewire::runtime::StructureType;
use handlewire::{ApiVersion, BridgeConfig, Device, Driver, NativeBool, NativeHandle, NativeResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::c_void;
use std::slice;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const DEVICE: NativeHandle = NativeHandle(0xD0);
pub const PHYSICAL_DEVICE: NativeHandle = NativeHandle(0xF0);

pub const DEVICE_NAME: &str = "Stub Rasterizer";
pub const DRIVER_NAME: &str = "stubdrv";
pub const DRIVER_INFO: &str = "recording stub";
pub const DEVICE_UUID: [u8; UUID_SIZE] = [7; UUID_SIZE];

/// Bytes of host-visible backing behind every memory handle
pub const MAPPABLE_SIZE: usize = 4096;

pub const QUEUE_FAMILIES: [QueueFamilyProperties; 3] = [
    QueueFamilyProperties {
        queue_flags: 0x7,
        queue_count: 16,
        timestamp_valid_bits: 64,
        min_image_transfer_granularity: Extent3D { width: 1, height: 1, depth: 1 },
    },
    QueueFamilyProperties {
        queue_flags: 0x4,
        queue_count: 2,
        timestamp_valid_bits: 64,
        min_image_transfer_granularity: Extent3D { width: 1, height: 1, depth: 1 },
    },
    QueueFamilyProperties {
        queue_flags: 0x2,
        queue_count: 1,
        timestamp_valid_bits: 0,
        min_image_transfer_granularity: Extent3D { width: 4, height: 4, depth: 1 },
    },
];

pub const EXTENSIONS: [(&str, u32); 3] = [
    ("VK_KHR_swapchain", 70),
    ("VK_KHR_maintenance1", 2),
    ("VK_EXT_memory_budget", 1),
];

#[derive(Debug, Clone, PartialEq)]
pub struct AllocateCall {
    pub pool: NativeHandle,
    pub level: i32,
    pub count: u32,
    pub tags: Vec<StructureType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorAllocateCall {
    pub pool: NativeHandle,
    pub layouts: Vec<NativeHandle>,
    pub variable_counts: Option<Vec<u32>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitBatch {
    pub wait_semaphores: Vec<NativeHandle>,
    pub wait_stages: Vec<u32>,
    pub command_buffers: Vec<NativeHandle>,
    pub signal_semaphores: Vec<NativeHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeginCall {
    pub buffer: NativeHandle,
    pub flags: u32,
    /// (subpass, occlusion_query_enable, framebuffer)
    pub inheritance: Option<(u32, bool, NativeHandle)>,
}

#[derive(Debug, Default)]
pub struct Recorded {
    /// Entry point names in call order
    pub calls: Vec<&'static str>,
    pub create_tags: Vec<Vec<StructureType>>,
    pub fence_flags: Vec<u32>,
    pub pool_families: Vec<u32>,
    pub command_allocations: Vec<AllocateCall>,
    pub command_frees: Vec<(NativeHandle, Vec<NativeHandle>)>,
    pub descriptor_allocations: Vec<DescriptorAllocateCall>,
    pub descriptor_frees: Vec<(NativeHandle, Vec<NativeHandle>)>,
    pub memory_allocations: Vec<(u64, u32, Vec<StructureType>)>,
    pub submits: Vec<(NativeHandle, Vec<SubmitBatch>, NativeHandle)>,
    pub waits: Vec<(Vec<NativeHandle>, bool, u64)>,
    pub begins: Vec<BeginCall>,
    pub cleared: Vec<Vec<ClearRect>>,
    pub destroyed: Vec<NativeHandle>,
    /// (memory, offset, size)
    pub maps: Vec<(NativeHandle, u64, u64)>,
    pub unmaps: Vec<NativeHandle>,
}

/// Driver double; every entry point records what it was given
pub struct StubDriver {
    next_handle: AtomicU64,
    recycled: Mutex<Vec<NativeHandle>>,
    allocate_failure: Mutex<Option<NativeResult>>,
    wait_result: Mutex<NativeResult>,
    map_failure: Mutex<Option<NativeResult>>,
    stale_extension_count: Mutex<bool>,
    mapped: Mutex<HashMap<NativeHandle, Box<[u8]>>>,
    pub recorded: Mutex<Recorded>,
}

impl StubDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_handle: AtomicU64::new(0x1000),
            recycled: Mutex::new(Vec::new()),
            allocate_failure: Mutex::new(None),
            wait_result: Mutex::new(NativeResult::SUCCESS),
            map_failure: Mutex::new(None),
            stale_extension_count: Mutex::new(false),
            mapped: Mutex::new(HashMap::new()),
            recorded: Mutex::new(Recorded::default()),
        })
    }

    /// Make the next handle handed out equal `handle`, as a driver reusing values would
    pub fn recycle(&self, handle: NativeHandle) {
        self.recycled.lock().push(handle);
    }

    /// Make batch allocations fail with `code`
    pub fn fail_allocations(&self, code: NativeResult) {
        *self.allocate_failure.lock() = Some(code);
    }

    /// Make `vkMapMemory` fail with `code`
    pub fn fail_maps(&self, code: NativeResult) {
        *self.map_failure.lock() = Some(code);
    }

    /// Report one extension fewer from the count call than the fill call has,
    /// as a driver whose list grew between the two calls would
    pub fn stale_extension_count(&self) {
        *self.stale_extension_count.lock() = true;
    }

    /// Host-visible contents behind `memory`; zeroed until first mapped
    pub fn memory_contents(&self, memory: NativeHandle) -> Vec<u8> {
        self.mapped
            .lock()
            .get(&memory)
            .map(|bytes| bytes.to_vec())
            .unwrap_or_else(|| vec![0; MAPPABLE_SIZE])
    }

    pub fn set_wait_result(&self, code: NativeResult) {
        *self.wait_result.lock() = code;
    }

    /// Drop everything recorded so far
    pub fn reset_recording(&self) {
        *self.recorded.lock() = Recorded::default();
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.recorded.lock().calls.clone()
    }

    pub fn call_count(&self, function: &str) -> usize {
        self.recorded.lock().calls.iter().filter(|&&name| name == function).count()
    }

    fn record(&self, function: &'static str) {
        self.recorded.lock().calls.push(function);
    }

    fn mint(&self) -> NativeHandle {
        self.recycled
            .lock()
            .pop()
            .unwrap_or_else(|| NativeHandle(self.next_handle.fetch_add(1, Ordering::SeqCst)))
    }

    unsafe fn create(&self, function: &'static str, info: *const c_void, out: *mut NativeHandle) -> NativeResult {
        self.record(function);
        self.recorded.lock().create_tags.push(chain_tags(info).to_vec());
        *out = self.mint();
        NativeResult::SUCCESS
    }

    fn batch_failure(&self) -> Option<NativeResult> {
        *self.allocate_failure.lock()
    }
}

/// Write a name into a fixed-size field, truncating so a NUL always fits
pub fn name_to_bytes<const N: usize>(name: &str, out: &mut [u8; N]) {
    let len = name.len().min(N.saturating_sub(1));
    out[..len].copy_from_slice(&name.as_bytes()[..len]);
    out[len..].fill(0);
}

unsafe fn copy_array<T: Copy>(ptr: *const T, count: u32) -> Vec<T> {
    if ptr.is_null() || count == 0 {
        Vec::new()
    } else {
        slice::from_raw_parts(ptr, count as usize).to_vec()
    }
}

impl Driver for StubDriver {
    unsafe fn destroy_device(&self, device: NativeHandle) {
        self.record("vkDestroyDevice");
        self.recorded.lock().destroyed.push(device);
    }

    unsafe fn create_fence(&self, _device: NativeHandle, info: *const FenceCreateInfo, out: *mut NativeHandle) -> NativeResult {
        self.recorded.lock().fence_flags.push((*info).flags);
        self.create("vkCreateFence", info.cast(), out)
    }

    unsafe fn destroy_fence(&self, _device: NativeHandle, fence: NativeHandle) {
        self.record("vkDestroyFence");
        self.recorded.lock().destroyed.push(fence);
    }

    unsafe fn get_fence_status(&self, _device: NativeHandle, _fence: NativeHandle) -> NativeResult {
        self.record("vkGetFenceStatus");
        NativeResult::NOT_READY
    }

    unsafe fn reset_fences(&self, _device: NativeHandle, _count: u32, _fences: *const NativeHandle) -> NativeResult {
        self.record("vkResetFences");
        NativeResult::SUCCESS
    }

    unsafe fn wait_for_fences(
        &self,
        _device: NativeHandle,
        count: u32,
        fences: *const NativeHandle,
        wait_all: NativeBool,
        timeout: u64,
    ) -> NativeResult {
        self.record("vkWaitForFences");
        self.recorded
            .lock()
            .waits
            .push((copy_array(fences, count), wait_all.into(), timeout));
        *self.wait_result.lock()
    }

    unsafe fn create_event(&self, _device: NativeHandle, info: *const EventCreateInfo, out: *mut NativeHandle) -> NativeResult {
        self.create("vkCreateEvent", info.cast(), out)
    }

    unsafe fn destroy_event(&self, _device: NativeHandle, event: NativeHandle) {
        self.record("vkDestroyEvent");
        self.recorded.lock().destroyed.push(event);
    }

    unsafe fn set_event(&self, _device: NativeHandle, _event: NativeHandle) -> NativeResult {
        self.record("vkSetEvent");
        NativeResult::SUCCESS
    }

    unsafe fn reset_event(&self, _device: NativeHandle, _event: NativeHandle) -> NativeResult {
        self.record("vkResetEvent");
        NativeResult::SUCCESS
    }

    unsafe fn get_event_status(&self, _device: NativeHandle, _event: NativeHandle) -> NativeResult {
        self.record("vkGetEventStatus");
        NativeResult::EVENT_RESET
    }

    unsafe fn get_device_queue(&self, _device: NativeHandle, family: u32, index: u32, out: *mut NativeHandle) {
        self.record("vkGetDeviceQueue");
        *out = NativeHandle(0x5000 + u64::from(family) * 16 + u64::from(index));
    }

    unsafe fn queue_submit(&self, queue: NativeHandle, count: u32, submits: *const SubmitInfo, fence: NativeHandle) -> NativeResult {
        self.record("vkQueueSubmit");
        let batches = copy_array(submits, count)
            .into_iter()
            .map(|info| SubmitBatch {
                wait_semaphores: copy_array(info.p_wait_semaphores, info.wait_semaphore_count),
                wait_stages: copy_array(info.p_wait_dst_stage_mask, info.wait_semaphore_count),
                command_buffers: copy_array(info.p_command_buffers, info.command_buffer_count),
                signal_semaphores: copy_array(info.p_signal_semaphores, info.signal_semaphore_count),
            })
            .collect();
        self.recorded.lock().submits.push((queue, batches, fence));
        NativeResult::SUCCESS
    }

    unsafe fn create_command_pool(
        &self,
        _device: NativeHandle,
        info: *const CommandPoolCreateInfo,
        out: *mut NativeHandle,
    ) -> NativeResult {
        self.recorded.lock().pool_families.push((*info).queue_family_index);
        self.create("vkCreateCommandPool", info.cast(), out)
    }

    unsafe fn destroy_command_pool(&self, _device: NativeHandle, pool: NativeHandle) {
        self.record("vkDestroyCommandPool");
        self.recorded.lock().destroyed.push(pool);
    }

    unsafe fn allocate_command_buffers(
        &self,
        _device: NativeHandle,
        info: *const CommandBufferAllocateInfo,
        out: *mut NativeHandle,
    ) -> NativeResult {
        self.record("vkAllocateCommandBuffers");
        let info_ref = &*info;
        self.recorded.lock().command_allocations.push(AllocateCall {
            pool: info_ref.command_pool,
            level: info_ref.level,
            count: info_ref.command_buffer_count,
            tags: chain_tags(info.cast()).to_vec(),
        });
        if let Some(code) = self.batch_failure() {
            return code;
        }
        for i in 0..info_ref.command_buffer_count as usize {
            *out.add(i) = self.mint();
        }
        NativeResult::SUCCESS
    }

    unsafe fn free_command_buffers(&self, _device: NativeHandle, pool: NativeHandle, count: u32, buffers: *const NativeHandle) {
        self.record("vkFreeCommandBuffers");
        self.recorded.lock().command_frees.push((pool, copy_array(buffers, count)));
    }

    unsafe fn begin_command_buffer(&self, buffer: NativeHandle, info: *const CommandBufferBeginInfo) -> NativeResult {
        self.record("vkBeginCommandBuffer");
        let info = &*info;
        let inheritance = info.p_inheritance_info.as_ref().map(|inherit| {
            (inherit.subpass, bool::from(inherit.occlusion_query_enable), inherit.framebuffer)
        });
        self.recorded.lock().begins.push(BeginCall {
            buffer,
            flags: info.flags,
            inheritance,
        });
        NativeResult::SUCCESS
    }

    unsafe fn end_command_buffer(&self, _buffer: NativeHandle) -> NativeResult {
        self.record("vkEndCommandBuffer");
        NativeResult::SUCCESS
    }

    unsafe fn cmd_clear_attachments(&self, _buffer: NativeHandle, rect_count: u32, rects: *const ClearRect) {
        self.record("vkCmdClearAttachments");
        self.recorded.lock().cleared.push(copy_array(rects, rect_count));
    }

    unsafe fn allocate_memory(&self, _device: NativeHandle, info: *const MemoryAllocateInfo, out: *mut NativeHandle) -> NativeResult {
        let info_ref = &*info;
        self.recorded.lock().memory_allocations.push((
            info_ref.allocation_size,
            info_ref.memory_type_index,
            chain_tags(info.cast()).to_vec(),
        ));
        self.create("vkAllocateMemory", info.cast(), out)
    }

    unsafe fn free_memory(&self, _device: NativeHandle, memory: NativeHandle) {
        self.record("vkFreeMemory");
        self.recorded.lock().destroyed.push(memory);
    }

    unsafe fn map_memory(
        &self,
        _device: NativeHandle,
        memory: NativeHandle,
        offset: u64,
        size: u64,
        _flags: u32,
        out: *mut *mut c_void,
    ) -> NativeResult {
        self.record("vkMapMemory");
        self.recorded.lock().maps.push((memory, offset, size));
        if let Some(code) = *self.map_failure.lock() {
            return code;
        }
        let end = offset.checked_add(size);
        if end.map_or(true, |end| end > MAPPABLE_SIZE as u64) {
            return NativeResult::ERROR_MEMORY_MAP_FAILED;
        }

        let mut mapped = self.mapped.lock();
        let backing = mapped
            .entry(memory)
            .or_insert_with(|| vec![0; MAPPABLE_SIZE].into_boxed_slice());
        *out = backing.as_mut_ptr().add(offset as usize).cast();
        NativeResult::SUCCESS
    }

    unsafe fn unmap_memory(&self, _device: NativeHandle, memory: NativeHandle) {
        self.record("vkUnmapMemory");
        self.recorded.lock().unmaps.push(memory);
    }

    unsafe fn create_descriptor_pool(
        &self,
        _device: NativeHandle,
        info: *const DescriptorPoolCreateInfo,
        out: *mut NativeHandle,
    ) -> NativeResult {
        self.create("vkCreateDescriptorPool", info.cast(), out)
    }

    unsafe fn destroy_descriptor_pool(&self, _device: NativeHandle, pool: NativeHandle) {
        self.record("vkDestroyDescriptorPool");
        self.recorded.lock().destroyed.push(pool);
    }

    unsafe fn allocate_descriptor_sets(
        &self,
        _device: NativeHandle,
        info: *const DescriptorSetAllocateInfo,
        out: *mut NativeHandle,
    ) -> NativeResult {
        self.record("vkAllocateDescriptorSets");
        let info_ref = &*info;

        // The only extension the tests chain here is the variable count one
        let variable_counts = (info_ref.p_next as *const DescriptorSetVariableDescriptorCountAllocateInfo)
            .as_ref()
            .map(|ext| copy_array(ext.p_descriptor_counts, ext.descriptor_set_count));

        self.recorded.lock().descriptor_allocations.push(DescriptorAllocateCall {
            pool: info_ref.descriptor_pool,
            layouts: copy_array(info_ref.p_set_layouts, info_ref.descriptor_set_count),
            variable_counts,
        });
        if let Some(code) = self.batch_failure() {
            return code;
        }
        for i in 0..info_ref.descriptor_set_count as usize {
            *out.add(i) = self.mint();
        }
        NativeResult::SUCCESS
    }

    unsafe fn free_descriptor_sets(
        &self,
        _device: NativeHandle,
        pool: NativeHandle,
        count: u32,
        sets: *const NativeHandle,
    ) -> NativeResult {
        self.record("vkFreeDescriptorSets");
        self.recorded.lock().descriptor_frees.push((pool, copy_array(sets, count)));
        NativeResult::SUCCESS
    }

    unsafe fn get_physical_device_properties2(&self, _physical_device: NativeHandle, out: *mut PhysicalDeviceProperties2) {
        self.record("vkGetPhysicalDeviceProperties2");

        let props = &mut (*out).properties;
        props.api_version = ApiVersion::new(1, 2, 0).0;
        props.driver_version = 42;
        props.vendor_id = 0x1234;
        props.device_id = 0x5678;
        props.device_type = 2;
        name_to_bytes(DEVICE_NAME, &mut props.device_name);

        let mut next = (*out).p_next;
        while !next.is_null() {
            let header = &*(next as *const BaseOutStructure);
            if header.s_type == structure_type::PHYSICAL_DEVICE_ID_PROPERTIES {
                let id = &mut *(next as *mut PhysicalDeviceIdProperties);
                id.device_uuid = DEVICE_UUID;
                id.device_node_mask = 1;
                id.device_luid_valid = NativeBool::TRUE;
            } else if header.s_type == structure_type::PHYSICAL_DEVICE_DRIVER_PROPERTIES {
                let driver = &mut *(next as *mut PhysicalDeviceDriverProperties);
                driver.driver_id = 9;
                name_to_bytes(DRIVER_NAME, &mut driver.driver_name);
                name_to_bytes(DRIVER_INFO, &mut driver.driver_info);
                driver.conformance_version = ConformanceVersion {
                    major: 1,
                    minor: 2,
                    subminor: 3,
                    patch: 4,
                };
            }
            next = header.p_next;
        }
    }

    unsafe fn get_physical_device_queue_family_properties(
        &self,
        _physical_device: NativeHandle,
        count: *mut u32,
        out: *mut QueueFamilyProperties,
    ) {
        self.record("vkGetPhysicalDeviceQueueFamilyProperties");
        self.fill_queue_families(count, out);
    }

    unsafe fn enumerate_device_extension_properties(
        &self,
        _physical_device: NativeHandle,
        count: *mut u32,
        out: *mut ExtensionProperties,
    ) -> NativeResult {
        self.record("vkEnumerateDeviceExtensionProperties");
        self.fill_extensions(count, out)
    }
}

impl StubDriver {
    unsafe fn fill_queue_families(&self, count: *mut u32, out: *mut QueueFamilyProperties) {
        if out.is_null() {
            *count = QUEUE_FAMILIES.len() as u32;
            return;
        }
        let filled = (*count as usize).min(QUEUE_FAMILIES.len());
        for (i, family) in QUEUE_FAMILIES.iter().take(filled).enumerate() {
            *out.add(i) = *family;
        }
        *count = filled as u32;
    }

    unsafe fn fill_extensions(&self, count: *mut u32, out: *mut ExtensionProperties) -> NativeResult {
        if out.is_null() {
            let hidden = usize::from(*self.stale_extension_count.lock());
            *count = (EXTENSIONS.len() - hidden) as u32;
            return NativeResult::SUCCESS;
        }
        let filled = (*count as usize).min(EXTENSIONS.len());
        for (i, (name, version)) in EXTENSIONS.iter().take(filled).enumerate() {
            let slot = &mut *out.add(i);
            name_to_bytes(name, &mut slot.extension_name);
            slot.spec_version = *version;
        }
        *count = filled as u32;
        if filled < EXTENSIONS.len() {
            NativeResult::INCOMPLETE
        } else {
            NativeResult::SUCCESS
        }
    }
}

/// A 1.2 device over a fresh stub driver
pub fn device() -> (Device, Arc<StubDriver>) {
    device_with(ApiVersion::V1_2, &BridgeConfig::default())
}

pub fn device_with(api_version: ApiVersion, config: &BridgeConfig) -> (Device, Arc<StubDriver>) {
    let driver = StubDriver::new();
    let device = Device::new(driver.clone(), DEVICE, api_version, config);
    (device, driver)
}
