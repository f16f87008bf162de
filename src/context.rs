//! Device context - state shared by a device and every wrapper it hands out
//!
//! Holds the driver, the identity store and the arena pool. Native calls go
//! through `call` so each one is logged and its result code checked the same
//! way.

use crate::driver::Driver;
use handlewire_runtime::logging::{log_native_call, log_native_return};
use handlewire_runtime::{
    ApiVersion, ArenaPool, BridgeConfig, CapabilityTier, IdentityStore, NativeHandle, NativeResult, Result,
};
use std::sync::Arc;

pub struct DeviceContext {
    driver: Arc<dyn Driver>,
    handle: NativeHandle,
    api_version: ApiVersion,
    store: IdentityStore,
    arenas: ArenaPool,
}

impl DeviceContext {
    pub(crate) fn new(driver: Arc<dyn Driver>, handle: NativeHandle, api_version: ApiVersion, config: &BridgeConfig) -> Self {
        Self {
            driver,
            handle,
            api_version,
            store: IdentityStore::new(&config.identity),
            arenas: ArenaPool::new(config.arena.clone()),
        }
    }

    #[inline]
    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    #[inline]
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Tier of wrappers created directly by this device
    #[inline]
    pub fn tier(&self) -> CapabilityTier {
        CapabilityTier::from_api_version(self.api_version)
    }

    #[inline]
    pub fn store(&self) -> &IdentityStore {
        &self.store
    }

    #[inline]
    pub fn arenas(&self) -> &ArenaPool {
        &self.arenas
    }

    #[inline]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Invoke a native entry point returning a result code
    ///
    /// Failing codes become `NativeFailure`; success codes (including
    /// informational ones such as `TIMEOUT`) are returned as is.
    pub(crate) fn call<F>(&self, function: &'static str, native: F) -> Result<NativeResult>
    where
        F: FnOnce(&dyn Driver) -> NativeResult,
    {
        log_native_call(function);
        let code = native(self.driver.as_ref());
        log_native_return(function, code.0);
        code.check()
    }

    /// Invoke a native entry point without a result code
    pub(crate) fn call_void<F>(&self, function: &'static str, native: F)
    where
        F: FnOnce(&dyn Driver),
    {
        log_native_call(function);
        native(self.driver.as_ref());
    }
}

impl core::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("handle", &self.handle)
            .field("api_version", &self.api_version)
            .field("store", &self.store)
            .finish()
    }
}
