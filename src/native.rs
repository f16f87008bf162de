//! Native records - the binary contract of the driver boundary
//!
//! Every chained record starts with `s_type` and `p_next` so the marshaler
//! can link it. All-zero is a valid bit pattern for every record here.

use core::ffi::c_void;
use handlewire_runtime::{NativeBool, NativeHandle, StructureType};

/// Structure-type tags understood by the driver
pub mod structure_type {
    use handlewire_runtime::StructureType;

    pub const SUBMIT_INFO: StructureType = StructureType(4);
    pub const MEMORY_ALLOCATE_INFO: StructureType = StructureType(5);
    pub const FENCE_CREATE_INFO: StructureType = StructureType(8);
    pub const EVENT_CREATE_INFO: StructureType = StructureType(10);
    pub const DESCRIPTOR_POOL_CREATE_INFO: StructureType = StructureType(33);
    pub const DESCRIPTOR_SET_ALLOCATE_INFO: StructureType = StructureType(34);
    pub const COMMAND_POOL_CREATE_INFO: StructureType = StructureType(39);
    pub const COMMAND_BUFFER_ALLOCATE_INFO: StructureType = StructureType(40);
    pub const COMMAND_BUFFER_INHERITANCE_INFO: StructureType = StructureType(41);
    pub const COMMAND_BUFFER_BEGIN_INFO: StructureType = StructureType(42);
    pub const PHYSICAL_DEVICE_PROPERTIES_2: StructureType = StructureType(1_000_059_001);
    pub const MEMORY_ALLOCATE_FLAGS_INFO: StructureType = StructureType(1_000_060_000);
    pub const PHYSICAL_DEVICE_ID_PROPERTIES: StructureType = StructureType(1_000_071_004);
    pub const EXPORT_FENCE_CREATE_INFO: StructureType = StructureType(1_000_113_000);
    pub const MEMORY_DEDICATED_ALLOCATE_INFO: StructureType = StructureType(1_000_127_001);
    pub const DESCRIPTOR_SET_VARIABLE_DESCRIPTOR_COUNT_ALLOCATE_INFO: StructureType =
        StructureType(1_000_161_003);
    pub const PHYSICAL_DEVICE_DRIVER_PROPERTIES: StructureType = StructureType(1_000_196_000);
}

pub const UUID_SIZE: usize = 16;
pub const LUID_SIZE: usize = 8;
pub const MAX_NAME_SIZE: usize = 256;
pub const MAX_EXTENSION_NAME_SIZE: usize = 256;

// ============================================================================
// Synchronization
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FenceCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ExportFenceCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub handle_types: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct EventCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SubmitInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub wait_semaphore_count: u32,
    pub p_wait_semaphores: *const NativeHandle,
    pub p_wait_dst_stage_mask: *const u32,
    pub command_buffer_count: u32,
    pub p_command_buffers: *const NativeHandle,
    pub signal_semaphore_count: u32,
    pub p_signal_semaphores: *const NativeHandle,
}

// ============================================================================
// Commands
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CommandPoolCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: u32,
    pub queue_family_index: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CommandBufferAllocateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub command_pool: NativeHandle,
    pub level: i32,
    pub command_buffer_count: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CommandBufferInheritanceInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub render_pass: NativeHandle,
    pub subpass: u32,
    pub framebuffer: NativeHandle,
    pub occlusion_query_enable: NativeBool,
    pub query_flags: u32,
    pub pipeline_statistics: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CommandBufferBeginInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: u32,
    pub p_inheritance_info: *const CommandBufferInheritanceInfo,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offset2D {
    pub x: i32,
    pub y: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect2D {
    pub offset: Offset2D,
    pub extent: Extent2D,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearRect {
    pub rect: Rect2D,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

// ============================================================================
// Memory
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MemoryAllocateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub allocation_size: u64,
    pub memory_type_index: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MemoryAllocateFlagsInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: u32,
    pub device_mask: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MemoryDedicatedAllocateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub image: NativeHandle,
    pub buffer: NativeHandle,
}

// ============================================================================
// Descriptors
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorPoolSize {
    pub ty: i32,
    pub descriptor_count: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DescriptorPoolCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: u32,
    pub max_sets: u32,
    pub pool_size_count: u32,
    pub p_pool_sizes: *const DescriptorPoolSize,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSetAllocateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub descriptor_pool: NativeHandle,
    pub descriptor_set_count: u32,
    pub p_set_layouts: *const NativeHandle,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSetVariableDescriptorCountAllocateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub descriptor_set_count: u32,
    pub p_descriptor_counts: *const u32,
}

// ============================================================================
// Device properties (output records)
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PhysicalDeviceProperties {
    pub api_version: u32,
    pub driver_version: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub device_type: i32,
    pub device_name: [u8; MAX_NAME_SIZE],
    pub pipeline_cache_uuid: [u8; UUID_SIZE],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PhysicalDeviceProperties2 {
    pub s_type: StructureType,
    pub p_next: *mut c_void,
    pub properties: PhysicalDeviceProperties,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PhysicalDeviceIdProperties {
    pub s_type: StructureType,
    pub p_next: *mut c_void,
    pub device_uuid: [u8; UUID_SIZE],
    pub driver_uuid: [u8; UUID_SIZE],
    pub device_luid: [u8; LUID_SIZE],
    pub device_node_mask: u32,
    pub device_luid_valid: NativeBool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConformanceVersion {
    pub major: u8,
    pub minor: u8,
    pub subminor: u8,
    pub patch: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PhysicalDeviceDriverProperties {
    pub s_type: StructureType,
    pub p_next: *mut c_void,
    pub driver_id: i32,
    pub driver_name: [u8; MAX_NAME_SIZE],
    pub driver_info: [u8; MAX_NAME_SIZE],
    pub conformance_version: ConformanceVersion,
}

/// Read a fixed-size, NUL-terminated name field
pub fn name_from_bytes(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

// ============================================================================
// Enumerations
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyProperties {
    pub queue_flags: u32,
    pub queue_count: u32,
    pub timestamp_valid_bits: u32,
    pub min_image_transfer_granularity: Extent3D,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ExtensionProperties {
    pub extension_name: [u8; MAX_EXTENSION_NAME_SIZE],
    pub spec_version: u32,
}
