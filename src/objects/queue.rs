use super::{Fence, NativeObject};
use crate::context::DeviceContext;
use crate::options::SubmitOptions;
use handlewire_runtime::marshal::marshal_slice;
use handlewire_runtime::{NativeHandle, NativeResult, Result, TierCell};
use std::sync::Arc;

/// A device queue; owned by the device, never destroyed on its own
pub struct Queue {
    handle: NativeHandle,
    context: Arc<DeviceContext>,
    tier: TierCell,
}

native_object!(Queue);

impl Queue {
    /// Submit batches with one native call, optionally signaling `fence`
    ///
    /// Every batch is validated before anything is allocated.
    pub fn submit(&self, submits: &[SubmitOptions], fence: Option<&Fence>) -> Result<NativeResult> {
        let mut arena = self.context.arenas().acquire();
        let (records, count) = marshal_slice(submits, &mut arena)?;
        let fence = fence.map_or(NativeHandle::NULL, |fence| fence.handle());

        self.context.call("vkQueueSubmit", |driver| unsafe {
            driver.queue_submit(self.handle, count, records.cast(), fence)
        })
    }
}
