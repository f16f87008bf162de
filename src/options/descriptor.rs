use crate::native::{self, structure_type};
use core::alloc::Layout;
use core::ptr::NonNull;
use handlewire_runtime::marshal::{alloc_plain_slice, alloc_slice, find_in_chain, narrow, record_mut};
use handlewire_runtime::{Arena, BridgeError, NativeHandle, Next, Options, PlainRecord, Result, StructureType};

/// Number of descriptors of one type a pool provides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorPoolSize {
    pub descriptor_type: i32,
    pub descriptor_count: usize,
}

impl PlainRecord for DescriptorPoolSize {
    type Native = native::DescriptorPoolSize;

    fn to_native(&self) -> Result<native::DescriptorPoolSize> {
        Ok(native::DescriptorPoolSize {
            ty: self.descriptor_type,
            descriptor_count: narrow(self.descriptor_count, "descriptor_count")?,
        })
    }
}

/// Descriptor pool creation
#[derive(Debug, Default)]
pub struct DescriptorPoolCreateOptions {
    pub flags: u32,
    pub max_sets: usize,
    pub pool_sizes: Vec<DescriptorPoolSize>,
    pub next: Next,
}

with_next!(DescriptorPoolCreateOptions);

impl Options for DescriptorPoolCreateOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::DESCRIPTOR_POOL_CREATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::DescriptorPoolCreateInfo>()
    }

    unsafe fn populate_record(&self, arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let (sizes, size_count) = alloc_plain_slice(arena, &self.pool_sizes)?;

        let info = record_mut::<native::DescriptorPoolCreateInfo>(record);
        info.flags = self.flags;
        info.max_sets = narrow(self.max_sets, "max_sets")?;
        info.pool_size_count = size_count;
        info.p_pool_sizes = sizes;
        Ok(())
    }

    chain_accessors!();
}

/// Batch allocation of descriptor sets, one per layout
///
/// The owning pool fills in its own handle when it allocates.
#[derive(Debug, Default)]
pub struct DescriptorSetAllocateOptions {
    pub set_layouts: Vec<NativeHandle>,
    pub next: Next,
}

with_next!(DescriptorSetAllocateOptions);

impl Options for DescriptorSetAllocateOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::DESCRIPTOR_SET_ALLOCATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::DescriptorSetAllocateInfo>()
    }

    fn validate(&self) -> Result<()> {
        if self.set_layouts.is_empty() {
            return Err(BridgeError::invalid_argument(
                "attempted to allocate descriptor sets without any set layouts",
            ));
        }

        let variable = find_in_chain(self, structure_type::DESCRIPTOR_SET_VARIABLE_DESCRIPTOR_COUNT_ALLOCATE_INFO)
            .and_then(|ext| ext.batch_len());
        if let Some(count) = variable {
            if count != self.set_layouts.len() {
                return Err(BridgeError::invalid_argument(format!(
                    "allocating {} descriptor sets but {} variable descriptor counts were provided; these should match",
                    self.set_layouts.len(),
                    count
                )));
            }
        }
        Ok(())
    }

    unsafe fn populate_record(&self, arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let (layouts, count) = alloc_slice(arena, &self.set_layouts)?;

        let info = record_mut::<native::DescriptorSetAllocateInfo>(record);
        info.descriptor_set_count = count;
        info.p_set_layouts = layouts;
        Ok(())
    }

    chain_accessors!();
}

/// Extension: descriptor count of the variable-sized binding, per set
#[derive(Debug, Default)]
pub struct DescriptorSetVariableCountOptions {
    pub descriptor_counts: Vec<u32>,
    pub next: Next,
}

with_next!(DescriptorSetVariableCountOptions);

impl Options for DescriptorSetVariableCountOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::DESCRIPTOR_SET_VARIABLE_DESCRIPTOR_COUNT_ALLOCATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::DescriptorSetVariableDescriptorCountAllocateInfo>()
    }

    fn batch_len(&self) -> Option<usize> {
        Some(self.descriptor_counts.len())
    }

    unsafe fn populate_record(&self, arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let (counts, count) = alloc_slice(arena, &self.descriptor_counts)?;

        let info = record_mut::<native::DescriptorSetVariableDescriptorCountAllocateInfo>(record);
        info.descriptor_set_count = count;
        info.p_descriptor_counts = counts;
        Ok(())
    }

    chain_accessors!();
}
