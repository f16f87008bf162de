use crate::context::DeviceContext;
use handlewire_runtime::{NativeHandle, NativeResult, Result, TierCell};
use std::sync::Arc;

pub struct Fence {
    handle: NativeHandle,
    context: Arc<DeviceContext>,
    tier: TierCell,
}

native_object!(Fence);

impl Fence {
    /// `SUCCESS` when signaled, `NOT_READY` otherwise
    pub fn status(&self) -> Result<NativeResult> {
        let device = self.context.handle();
        self.context
            .call("vkGetFenceStatus", |driver| unsafe { driver.get_fence_status(device, self.handle) })
    }

    pub fn reset(&self) -> Result<NativeResult> {
        let device = self.context.handle();
        self.context
            .call("vkResetFences", |driver| unsafe { driver.reset_fences(device, 1, &self.handle) })
    }
}

pub struct Event {
    handle: NativeHandle,
    context: Arc<DeviceContext>,
    tier: TierCell,
}

native_object!(Event);

impl Event {
    pub fn set(&self) -> Result<NativeResult> {
        let device = self.context.handle();
        self.context
            .call("vkSetEvent", |driver| unsafe { driver.set_event(device, self.handle) })
    }

    pub fn reset(&self) -> Result<NativeResult> {
        let device = self.context.handle();
        self.context
            .call("vkResetEvent", |driver| unsafe { driver.reset_event(device, self.handle) })
    }

    /// `EVENT_SET` or `EVENT_RESET`
    pub fn status(&self) -> Result<NativeResult> {
        let device = self.context.handle();
        self.context
            .call("vkGetEventStatus", |driver| unsafe { driver.get_event_status(device, self.handle) })
    }
}
