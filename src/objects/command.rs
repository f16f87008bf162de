use super::resolve;
use crate::context::DeviceContext;
use crate::native;
use crate::options::{ClearRect, CommandBufferAllocateOptions, CommandBufferBeginOptions};
use handlewire_runtime::marshal::{alloc_output, alloc_plain_slice, count_of, marshal, record_mut};
use handlewire_runtime::{BridgeError, NativeHandle, NativeResult, Result, TierCell, Tiered};
use smallvec::SmallVec;
use std::sync::Arc;

pub struct CommandPool {
    handle: NativeHandle,
    context: Arc<DeviceContext>,
    tier: TierCell,
}

native_object!(CommandPool);

impl CommandPool {
    /// Allocate a batch of command buffers with one native call
    ///
    /// Wrappers are returned in the order the driver wrote the handles, each
    /// registered at this pool's tier. A failing code yields `NativeFailure`
    /// and no wrappers; buffers a driver may have partially allocated are
    /// left to the caller.
    pub fn allocate_command_buffers(
        &self,
        options: &CommandBufferAllocateOptions,
    ) -> Result<(Vec<Arc<CommandBuffer>>, NativeResult)> {
        let device = self.context.handle();
        let mut arena = self.context.arenas().acquire();

        let info = marshal(options, &mut arena)?;
        unsafe {
            record_mut::<native::CommandBufferAllocateInfo>(info.cast()).command_pool = self.handle;
        }
        let out = alloc_output::<NativeHandle>(&mut arena, options.buffer_count)?;

        let code = self.context.call("vkAllocateCommandBuffers", |driver| unsafe {
            driver.allocate_command_buffers(device, info.as_ptr().cast_const().cast(), out)
        })?;

        let handles = unsafe { std::slice::from_raw_parts(out, options.buffer_count) };
        let tier = self.tier();
        let buffers = handles
            .iter()
            .map(|&handle| {
                resolve(&self.context, handle, tier, |context, handle| {
                    CommandBuffer::from_raw(context, handle, self.handle)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((buffers, code))
    }

    /// Return command buffers to this pool with one native call
    ///
    /// The wrappers stay registered; call `forget_command_buffers` once the
    /// application has dropped them.
    pub fn free_command_buffers(&self, buffers: &[Arc<CommandBuffer>]) -> Result<()> {
        if buffers.is_empty() {
            return Ok(());
        }
        if let Some(stranger) = buffers.iter().find(|buffer| buffer.pool != self.handle) {
            return Err(BridgeError::invalid_argument(format!(
                "command buffer {} belongs to pool {}, not {}",
                stranger.handle, stranger.pool, self.handle
            )));
        }

        let handles: SmallVec<[NativeHandle; 8]> = buffers.iter().map(|buffer| buffer.handle).collect();
        let count = count_of(&handles, "command_buffers")?;
        let device = self.context.handle();

        self.context.call_void("vkFreeCommandBuffers", |driver| unsafe {
            driver.free_command_buffers(device, self.handle, count, handles.as_ptr())
        });
        Ok(())
    }

    /// Drop the identity entries of freed command buffers
    pub fn forget_command_buffers(&self, buffers: &[Arc<CommandBuffer>]) {
        for buffer in buffers {
            self.context.store().forget(buffer.handle);
        }
    }
}

pub struct CommandBuffer {
    handle: NativeHandle,
    context: Arc<DeviceContext>,
    tier: TierCell,
    pool: NativeHandle,
}

native_object!(CommandBuffer, pool);

impl CommandBuffer {
    /// Handle of the pool this buffer was allocated from
    #[inline]
    pub fn pool(&self) -> NativeHandle {
        self.pool
    }

    pub fn begin(&self, options: &CommandBufferBeginOptions) -> Result<NativeResult> {
        let mut arena = self.context.arenas().acquire();
        let info = marshal(options, &mut arena)?;

        self.context.call("vkBeginCommandBuffer", |driver| unsafe {
            driver.begin_command_buffer(self.handle, info.as_ptr().cast_const().cast())
        })
    }

    pub fn end(&self) -> Result<NativeResult> {
        self.context
            .call("vkEndCommandBuffer", |driver| unsafe { driver.end_command_buffer(self.handle) })
    }

    pub fn clear_attachments(&self, rects: &[ClearRect]) -> Result<()> {
        let mut arena = self.context.arenas().acquire();
        let (records, count) = alloc_plain_slice(&mut arena, rects)?;

        self.context.call_void("vkCmdClearAttachments", |driver| unsafe {
            driver.cmd_clear_attachments(self.handle, count, records)
        });
        Ok(())
    }
}
