use crate::native::{self, structure_type};
use core::alloc::Layout;
use core::ptr::NonNull;
use handlewire_runtime::marshal::record_mut;
use handlewire_runtime::{Arena, BridgeError, NativeHandle, Next, Options, Result, StructureType};

/// Device memory allocation
#[derive(Debug, Default)]
pub struct MemoryAllocateOptions {
    pub allocation_size: u64,
    pub memory_type_index: u32,
    pub next: Next,
}

with_next!(MemoryAllocateOptions);

impl Options for MemoryAllocateOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::MEMORY_ALLOCATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::MemoryAllocateInfo>()
    }

    fn validate(&self) -> Result<()> {
        if self.allocation_size == 0 {
            return Err(BridgeError::invalid_argument("memory allocation size must be greater than zero"));
        }
        Ok(())
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let info = record_mut::<native::MemoryAllocateInfo>(record);
        info.allocation_size = self.allocation_size;
        info.memory_type_index = self.memory_type_index;
        Ok(())
    }

    chain_accessors!();
}

/// Extension: device group allocation flags
#[derive(Debug, Default)]
pub struct MemoryAllocateFlagsOptions {
    pub flags: u32,
    pub device_mask: u32,
    pub next: Next,
}

with_next!(MemoryAllocateFlagsOptions);

impl Options for MemoryAllocateFlagsOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::MEMORY_ALLOCATE_FLAGS_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::MemoryAllocateFlagsInfo>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let info = record_mut::<native::MemoryAllocateFlagsInfo>(record);
        info.flags = self.flags;
        info.device_mask = self.device_mask;
        Ok(())
    }

    chain_accessors!();
}

/// Extension: memory dedicated to exactly one image or one buffer
#[derive(Debug, Default)]
pub struct MemoryDedicatedAllocateOptions {
    pub image: Option<NativeHandle>,
    pub buffer: Option<NativeHandle>,
    pub next: Next,
}

with_next!(MemoryDedicatedAllocateOptions);

impl Options for MemoryDedicatedAllocateOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::MEMORY_DEDICATED_ALLOCATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::MemoryDedicatedAllocateInfo>()
    }

    fn validate(&self) -> Result<()> {
        if self.image.is_some() && self.buffer.is_some() {
            return Err(BridgeError::invalid_argument(
                "dedicated allocation may target an image or a buffer, not both",
            ));
        }
        Ok(())
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let info = record_mut::<native::MemoryDedicatedAllocateInfo>(record);
        info.image = self.image.unwrap_or(NativeHandle::NULL);
        info.buffer = self.buffer.unwrap_or(NativeHandle::NULL);
        Ok(())
    }

    chain_accessors!();
}
