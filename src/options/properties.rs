//! Output structures filled in by the driver
//!
//! These marshal to zeroed records carrying only their header; after the
//! native call `populate` copies the driver's answers back field by field.

use crate::native::{self, name_from_bytes, structure_type, LUID_SIZE, UUID_SIZE};
use core::alloc::Layout;
use core::ptr::NonNull;
use handlewire_runtime::marshal::record_ref;
use handlewire_runtime::{ApiVersion, Arena, Next, Options, Result, StructureType};

/// General properties of a physical device, head of the properties chain
#[derive(Debug, Default)]
pub struct DeviceProperties {
    pub api_version: ApiVersion,
    pub driver_version: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub device_type: i32,
    pub device_name: String,
    pub pipeline_cache_uuid: [u8; UUID_SIZE],
    pub next: Next,
}

with_next!(DeviceProperties);

impl Options for DeviceProperties {
    fn structure_type(&self) -> StructureType {
        structure_type::PHYSICAL_DEVICE_PROPERTIES_2
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::PhysicalDeviceProperties2>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, _record: NonNull<u8>) -> Result<()> {
        Ok(())
    }

    unsafe fn populate_out(&mut self, record: NonNull<u8>) -> Result<()> {
        let props = &record_ref::<native::PhysicalDeviceProperties2>(record).properties;
        self.api_version = ApiVersion(props.api_version);
        self.driver_version = props.driver_version;
        self.vendor_id = props.vendor_id;
        self.device_id = props.device_id;
        self.device_type = props.device_type;
        self.device_name = name_from_bytes(&props.device_name);
        self.pipeline_cache_uuid = props.pipeline_cache_uuid;
        Ok(())
    }

    chain_accessors!();
}

/// Extension: identifiers shared with other APIs and processes
#[derive(Debug, Default)]
pub struct DeviceIdProperties {
    pub device_uuid: [u8; UUID_SIZE],
    pub driver_uuid: [u8; UUID_SIZE],
    pub device_luid: [u8; LUID_SIZE],
    pub device_node_mask: u32,
    pub device_luid_valid: bool,
    pub next: Next,
}

with_next!(DeviceIdProperties);

impl Options for DeviceIdProperties {
    fn structure_type(&self) -> StructureType {
        structure_type::PHYSICAL_DEVICE_ID_PROPERTIES
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::PhysicalDeviceIdProperties>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, _record: NonNull<u8>) -> Result<()> {
        Ok(())
    }

    unsafe fn populate_out(&mut self, record: NonNull<u8>) -> Result<()> {
        let props = record_ref::<native::PhysicalDeviceIdProperties>(record);
        self.device_uuid = props.device_uuid;
        self.driver_uuid = props.driver_uuid;
        self.device_luid = props.device_luid;
        self.device_node_mask = props.device_node_mask;
        self.device_luid_valid = props.device_luid_valid.into();
        Ok(())
    }

    chain_accessors!();
}

/// Extension: driver identification and conformance level
#[derive(Debug, Default)]
pub struct DriverProperties {
    pub driver_id: i32,
    pub driver_name: String,
    pub driver_info: String,
    /// (major, minor, subminor, patch)
    pub conformance_version: (u8, u8, u8, u8),
    pub next: Next,
}

with_next!(DriverProperties);

impl Options for DriverProperties {
    fn structure_type(&self) -> StructureType {
        structure_type::PHYSICAL_DEVICE_DRIVER_PROPERTIES
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::PhysicalDeviceDriverProperties>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, _record: NonNull<u8>) -> Result<()> {
        Ok(())
    }

    unsafe fn populate_out(&mut self, record: NonNull<u8>) -> Result<()> {
        let props = record_ref::<native::PhysicalDeviceDriverProperties>(record);
        self.driver_id = props.driver_id;
        self.driver_name = name_from_bytes(&props.driver_name);
        self.driver_info = name_from_bytes(&props.driver_info);
        let version = props.conformance_version;
        self.conformance_version = (version.major, version.minor, version.subminor, version.patch);
        Ok(())
    }

    chain_accessors!();
}

// ============================================================================
// Enumerated outputs
// ============================================================================

/// One queue family, as reported by the count-then-fill enumeration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamily {
    pub flags: u32,
    pub queue_count: u32,
    pub timestamp_valid_bits: u32,
    pub min_image_transfer_granularity: (u32, u32, u32),
}

impl From<native::QueueFamilyProperties> for QueueFamily {
    fn from(props: native::QueueFamilyProperties) -> Self {
        let granularity = props.min_image_transfer_granularity;
        Self {
            flags: props.queue_flags,
            queue_count: props.queue_count,
            timestamp_valid_bits: props.timestamp_valid_bits,
            min_image_transfer_granularity: (granularity.width, granularity.height, granularity.depth),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionProperties {
    pub extension_name: String,
    pub spec_version: u32,
}

impl From<native::ExtensionProperties> for ExtensionProperties {
    fn from(props: native::ExtensionProperties) -> Self {
        Self {
            extension_name: name_from_bytes(&props.extension_name),
            spec_version: props.spec_version,
        }
    }
}
