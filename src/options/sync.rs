use crate::native::{self, structure_type};
use crate::objects::{CommandBuffer, NativeObject};
use core::alloc::Layout;
use core::ptr::NonNull;
use handlewire_runtime::marshal::{alloc_slice, record_mut};
use handlewire_runtime::{Arena, BridgeError, NativeHandle, Next, Options, Result, StructureType};
use smallvec::SmallVec;
use std::sync::Arc;

/// Fence creation
#[derive(Debug, Default)]
pub struct FenceCreateOptions {
    pub flags: u32,
    pub next: Next,
}

with_next!(FenceCreateOptions);

impl Options for FenceCreateOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::FENCE_CREATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::FenceCreateInfo>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        record_mut::<native::FenceCreateInfo>(record).flags = self.flags;
        Ok(())
    }

    chain_accessors!();
}

/// Extension: external handle types a fence may be exported as
#[derive(Debug, Default)]
pub struct ExportFenceCreateOptions {
    pub handle_types: u32,
    pub next: Next,
}

with_next!(ExportFenceCreateOptions);

impl Options for ExportFenceCreateOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::EXPORT_FENCE_CREATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::ExportFenceCreateInfo>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        record_mut::<native::ExportFenceCreateInfo>(record).handle_types = self.handle_types;
        Ok(())
    }

    chain_accessors!();
}

/// Event creation
#[derive(Debug, Default)]
pub struct EventCreateOptions {
    pub flags: u32,
    pub next: Next,
}

with_next!(EventCreateOptions);

impl Options for EventCreateOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::EVENT_CREATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::EventCreateInfo>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        record_mut::<native::EventCreateInfo>(record).flags = self.flags;
        Ok(())
    }

    chain_accessors!();
}

/// One batch of a queue submission
///
/// `wait_semaphores` and `wait_dst_stages` are parallel arrays.
#[derive(Debug, Default)]
pub struct SubmitOptions {
    pub wait_semaphores: Vec<NativeHandle>,
    pub wait_dst_stages: Vec<u32>,
    pub command_buffers: Vec<Arc<CommandBuffer>>,
    pub signal_semaphores: Vec<NativeHandle>,
    pub next: Next,
}

with_next!(SubmitOptions);

impl Options for SubmitOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::SUBMIT_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::SubmitInfo>()
    }

    fn validate(&self) -> Result<()> {
        if self.wait_semaphores.len() != self.wait_dst_stages.len() {
            return Err(BridgeError::invalid_argument(format!(
                "attempted to submit with {} wait semaphores but {} dst stages; these should match",
                self.wait_semaphores.len(),
                self.wait_dst_stages.len()
            )));
        }
        Ok(())
    }

    unsafe fn populate_record(&self, arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let buffers: SmallVec<[NativeHandle; 8]> = self.command_buffers.iter().map(|b| b.handle()).collect();

        let (wait_semaphores, wait_count) = alloc_slice(arena, &self.wait_semaphores)?;
        let (wait_stages, _) = alloc_slice(arena, &self.wait_dst_stages)?;
        let (command_buffers, buffer_count) = alloc_slice(arena, buffers.as_slice())?;
        let (signal_semaphores, signal_count) = alloc_slice(arena, &self.signal_semaphores)?;

        let info = record_mut::<native::SubmitInfo>(record);
        info.wait_semaphore_count = wait_count;
        info.p_wait_semaphores = wait_semaphores;
        info.p_wait_dst_stage_mask = wait_stages;
        info.command_buffer_count = buffer_count;
        info.p_command_buffers = command_buffers;
        info.signal_semaphore_count = signal_count;
        info.p_signal_semaphores = signal_semaphores;
        Ok(())
    }

    chain_accessors!();
}
