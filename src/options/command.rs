use crate::native::{self, structure_type, Extent2D, Offset2D, Rect2D};
use core::alloc::Layout;
use core::ptr::NonNull;
use handlewire_runtime::marshal::{marshal_nested, narrow, record_mut, validate_chain};
use handlewire_runtime::{Arena, BridgeError, NativeHandle, Next, Options, PlainRecord, Result, StructureType};

/// Command pool creation; the queue family is required
#[derive(Debug, Default)]
pub struct CommandPoolCreateOptions {
    pub queue_family_index: Option<u32>,
    pub flags: u32,
    pub next: Next,
}

with_next!(CommandPoolCreateOptions);

impl Options for CommandPoolCreateOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::COMMAND_POOL_CREATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::CommandPoolCreateInfo>()
    }

    fn validate(&self) -> Result<()> {
        if self.queue_family_index.is_none() {
            return Err(BridgeError::invalid_argument(
                "attempted to create a command pool without setting the queue family index",
            ));
        }
        Ok(())
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let info = record_mut::<native::CommandPoolCreateInfo>(record);
        info.flags = self.flags;
        info.queue_family_index = self.queue_family_index.unwrap_or_default();
        Ok(())
    }

    chain_accessors!();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum CommandBufferLevel {
    #[default]
    Primary = 0,
    Secondary = 1,
}

/// Batch allocation of command buffers
///
/// The owning pool fills in its own handle when it allocates.
#[derive(Debug, Default)]
pub struct CommandBufferAllocateOptions {
    pub level: CommandBufferLevel,
    pub buffer_count: usize,
    pub next: Next,
}

with_next!(CommandBufferAllocateOptions);

impl CommandBufferAllocateOptions {
    pub fn new(level: CommandBufferLevel, buffer_count: usize) -> Self {
        Self {
            level,
            buffer_count,
            next: None,
        }
    }
}

impl Options for CommandBufferAllocateOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::COMMAND_BUFFER_ALLOCATE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::CommandBufferAllocateInfo>()
    }

    fn validate(&self) -> Result<()> {
        if self.buffer_count == 0 {
            return Err(BridgeError::invalid_argument(
                "attempted to allocate zero command buffers",
            ));
        }
        Ok(())
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let info = record_mut::<native::CommandBufferAllocateInfo>(record);
        info.level = self.level as i32;
        info.command_buffer_count = narrow(self.buffer_count, "buffer_count")?;
        Ok(())
    }

    chain_accessors!();
}

/// State a secondary command buffer inherits from its primary
#[derive(Debug, Default)]
pub struct CommandBufferInheritanceOptions {
    pub render_pass: Option<NativeHandle>,
    pub subpass: usize,
    pub framebuffer: Option<NativeHandle>,
    pub occlusion_query_enable: bool,
    pub query_flags: u32,
    pub pipeline_statistics: u32,
    pub next: Next,
}

with_next!(CommandBufferInheritanceOptions);

impl Options for CommandBufferInheritanceOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::COMMAND_BUFFER_INHERITANCE_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::CommandBufferInheritanceInfo>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let info = record_mut::<native::CommandBufferInheritanceInfo>(record);
        info.render_pass = self.render_pass.unwrap_or(NativeHandle::NULL);
        info.subpass = narrow(self.subpass, "subpass")?;
        info.framebuffer = self.framebuffer.unwrap_or(NativeHandle::NULL);
        info.occlusion_query_enable = self.occlusion_query_enable.into();
        info.query_flags = self.query_flags;
        info.pipeline_statistics = self.pipeline_statistics;
        Ok(())
    }

    chain_accessors!();
}

/// Start of command recording
#[derive(Debug, Default)]
pub struct CommandBufferBeginOptions {
    pub flags: u32,
    pub inheritance: Option<CommandBufferInheritanceOptions>,
    pub next: Next,
}

with_next!(CommandBufferBeginOptions);

impl Options for CommandBufferBeginOptions {
    fn structure_type(&self) -> StructureType {
        structure_type::COMMAND_BUFFER_BEGIN_INFO
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<native::CommandBufferBeginInfo>()
    }

    fn validate(&self) -> Result<()> {
        if let Some(inheritance) = &self.inheritance {
            validate_chain(inheritance)?;
        }
        Ok(())
    }

    unsafe fn populate_record(&self, arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        // Nested structure with its own chain, marshaled separately
        let inheritance = marshal_nested(self.inheritance.as_ref().map(|i| i as &dyn Options), arena)?;

        let info = record_mut::<native::CommandBufferBeginInfo>(record);
        info.flags = self.flags;
        info.p_inheritance_info = inheritance.cast();
        Ok(())
    }

    chain_accessors!();
}

/// Region of an attachment to clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub base_array_layer: usize,
    pub layer_count: usize,
}

impl PlainRecord for ClearRect {
    type Native = native::ClearRect;

    fn to_native(&self) -> Result<native::ClearRect> {
        Ok(native::ClearRect {
            rect: Rect2D {
                offset: Offset2D { x: self.x, y: self.y },
                extent: Extent2D {
                    width: self.width,
                    height: self.height,
                },
            },
            base_array_layer: narrow(self.base_array_layer, "base_array_layer")?,
            layer_count: narrow(self.layer_count, "layer_count")?,
        })
    }
}
