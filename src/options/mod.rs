//! Configuration objects - typed descriptions of native records
//!
//! Each type here implements `Options` (or `PlainRecord`) and is turned into
//! its native record by the runtime marshaler. Extension structures are
//! attached through the `next` field of their parent.

/// Implements `as_any` and the chain accessors of `Options` over a `next: Next` field
macro_rules! chain_accessors {
    () => {
        fn as_any(&self) -> Option<&dyn core::any::Any> {
            Some(self)
        }

        fn next_in_chain(&self) -> Option<&dyn handlewire_runtime::Options> {
            self.next.as_deref()
        }

        fn next_in_chain_mut(&mut self) -> Option<&mut (dyn handlewire_runtime::Options + 'static)> {
            self.next.as_deref_mut()
        }
    };
}

/// Adds a `with_next` builder attaching an extension structure
macro_rules! with_next {
    ($ty:ty) => {
        impl $ty {
            /// Attach `next` as this structure's extension chain
            pub fn with_next(mut self, next: impl handlewire_runtime::Options + 'static) -> Self {
                self.next = Some(Box::new(next));
                self
            }
        }
    };
}

mod command;
mod descriptor;
mod memory;
mod properties;
mod sync;

pub use command::{
    ClearRect, CommandBufferAllocateOptions, CommandBufferBeginOptions, CommandBufferInheritanceOptions,
    CommandBufferLevel, CommandPoolCreateOptions,
};
pub use descriptor::{
    DescriptorPoolCreateOptions, DescriptorPoolSize, DescriptorSetAllocateOptions, DescriptorSetVariableCountOptions,
};
pub use memory::{MemoryAllocateFlagsOptions, MemoryAllocateOptions, MemoryDedicatedAllocateOptions};
pub use properties::{DeviceIdProperties, DeviceProperties, DriverProperties, ExtensionProperties, QueueFamily};
pub use sync::{EventCreateOptions, ExportFenceCreateOptions, FenceCreateOptions, SubmitOptions};

pub mod flags {
    //! Flag bits accepted by the configuration objects

    pub const FENCE_CREATE_SIGNALED: u32 = 0x1;
    pub const EVENT_CREATE_DEVICE_ONLY: u32 = 0x1;

    pub const COMMAND_POOL_CREATE_TRANSIENT: u32 = 0x1;
    pub const COMMAND_POOL_CREATE_RESET_COMMAND_BUFFER: u32 = 0x2;
    pub const COMMAND_POOL_CREATE_PROTECTED: u32 = 0x4;

    pub const COMMAND_BUFFER_USAGE_ONE_TIME_SUBMIT: u32 = 0x1;
    pub const COMMAND_BUFFER_USAGE_RENDER_PASS_CONTINUE: u32 = 0x2;
    pub const COMMAND_BUFFER_USAGE_SIMULTANEOUS_USE: u32 = 0x4;

    pub const MEMORY_ALLOCATE_DEVICE_MASK: u32 = 0x1;

    pub const DESCRIPTOR_POOL_CREATE_FREE_DESCRIPTOR_SET: u32 = 0x1;

    pub const PIPELINE_STAGE_TOP_OF_PIPE: u32 = 0x1;
    pub const PIPELINE_STAGE_TRANSFER: u32 = 0x1000;
    pub const PIPELINE_STAGE_ALL_COMMANDS: u32 = 0x10000;
}
