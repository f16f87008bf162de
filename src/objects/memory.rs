use crate::context::DeviceContext;
use handlewire_runtime::marshal::narrow;
use handlewire_runtime::{BridgeError, NativeHandle, NativeResult, Result, TierCell};
use core::ffi::c_void;
use core::ptr::{self, NonNull};
use std::sync::Arc;

/// A device memory allocation
pub struct DeviceMemory {
    handle: NativeHandle,
    context: Arc<DeviceContext>,
    tier: TierCell,
}

native_object!(DeviceMemory);

impl DeviceMemory {
    /// Map `size` bytes starting at `offset` into host address space
    ///
    /// The mapping lasts until the returned guard is dropped.
    pub fn map_memory(&self, offset: u64, size: u64) -> Result<(MappedMemory<'_>, NativeResult)> {
        if size == 0 {
            return Err(BridgeError::invalid_argument("attempted to map zero bytes of device memory"));
        }
        let len: usize = narrow(size, "size")?;
        let device = self.context.handle();
        let mut data: *mut c_void = ptr::null_mut();

        let code = self.context.call("vkMapMemory", |driver| unsafe {
            driver.map_memory(device, self.handle, offset, size, 0, &mut data)
        })?;

        let Some(base) = NonNull::new(data.cast::<u8>()) else {
            // Mapped but unusable; release the mapping before reporting
            self.unmap_memory();
            return Err(BridgeError::invariant("vkMapMemory succeeded with a null pointer"));
        };
        Ok((MappedMemory { memory: self, base, len }, code))
    }

    /// End the current mapping
    ///
    /// `MappedMemory` calls this on drop; calling it directly is only needed
    /// for a mapping obtained outside this crate.
    pub fn unmap_memory(&self) {
        let device = self.context.handle();
        self.context
            .call_void("vkUnmapMemory", |driver| unsafe { driver.unmap_memory(device, self.handle) });
    }

    /// Copy `data` into the allocation at `offset`
    ///
    /// Maps exactly `data.len()` bytes and unmaps before returning.
    pub fn write_data(&self, offset: u64, data: &[u8]) -> Result<NativeResult> {
        let size: u64 = narrow(data.len(), "data length")?;
        let (mut mapping, code) = self.map_memory(offset, size)?;
        mapping.as_mut_slice().copy_from_slice(data);
        Ok(code)
    }
}

/// Host view of a mapped range; unmaps when dropped
pub struct MappedMemory<'a> {
    memory: &'a DeviceMemory,
    base: NonNull<u8>,
    len: usize,
}

impl MappedMemory<'_> {
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        // Safety: the driver mapped `len` bytes at `base` and the range stays
        // mapped until this guard drops
        unsafe { core::slice::from_raw_parts(self.base.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // Safety: as above; `&mut self` keeps the view unique
        unsafe { core::slice::from_raw_parts_mut(self.base.as_ptr(), self.len) }
    }
}

impl Drop for MappedMemory<'_> {
    fn drop(&mut self) {
        self.memory.unmap_memory();
    }
}

impl core::fmt::Debug for MappedMemory<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MappedMemory")
            .field("memory", &self.memory.handle)
            .field("len", &self.len)
            .finish()
    }
}
