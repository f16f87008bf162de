// Core modules
pub mod context;
pub mod device;
pub mod driver;
pub mod native;
pub mod objects;
pub mod options;

// Re-export commonly used items
pub use context::DeviceContext;
pub use device::Device;
pub use driver::Driver;
pub use objects::{
    CommandBuffer, CommandPool, DescriptorPool, DescriptorSet, DeviceMemory, Event, Fence, MappedMemory, NativeObject,
    Queue,
};
pub use options::{
    ClearRect, CommandBufferAllocateOptions, CommandBufferBeginOptions, CommandBufferInheritanceOptions,
    CommandBufferLevel, CommandPoolCreateOptions, DescriptorPoolCreateOptions, DescriptorPoolSize,
    DescriptorSetAllocateOptions, DescriptorSetVariableCountOptions, DeviceIdProperties, DeviceProperties,
    DriverProperties, EventCreateOptions, ExportFenceCreateOptions, ExtensionProperties, FenceCreateOptions,
    MemoryAllocateFlagsOptions, MemoryAllocateOptions, MemoryDedicatedAllocateOptions, QueueFamily, SubmitOptions,
};

pub use handlewire_runtime as runtime;
pub use handlewire_runtime::{
    ApiVersion, BridgeConfig, BridgeError, CapabilityTier, NativeBool, NativeHandle, NativeResult, Options, Result,
    TierPolicy, Tiered,
};

/// Crate version, as reported in the startup log line
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialise logging from the environment
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    handlewire_runtime::logging::init();
}

/// Initialise logging from the `[logging]` section of `config`
///
/// Environment variables are not consulted; `RUST_LOG` still overrides the
/// level filter. Later calls are ignored.
pub fn init_logging_with(config: &BridgeConfig) {
    handlewire_runtime::logging::init_with_config(config.logging.to_log_config());
}
