//! Error types - one enum for every failure the bridge can surface
//!
//! Design: four kinds, matching who is at fault:
//! - `InvalidArgument`: caller configuration is structurally wrong (checked before any native call)
//! - `OutOfMemory`: arena exhaustion, fatal to the in-flight call
//! - `NativeFailure`: the native entry point returned a failing result code
//! - `InvariantViolation`: the glue layer above the core misused it

use thiserror::Error;

/// Native result code, passed through verbatim.
///
/// Non-negative codes are successes (some of them, like `TIMEOUT`, are
/// informational); negative codes are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NativeResult(pub i32);

impl NativeResult {
    pub const SUCCESS: Self = Self(0);
    pub const NOT_READY: Self = Self(1);
    pub const TIMEOUT: Self = Self(2);
    pub const EVENT_SET: Self = Self(3);
    pub const EVENT_RESET: Self = Self(4);
    pub const INCOMPLETE: Self = Self(5);
    pub const ERROR_OUT_OF_HOST_MEMORY: Self = Self(-1);
    pub const ERROR_OUT_OF_DEVICE_MEMORY: Self = Self(-2);
    pub const ERROR_INITIALIZATION_FAILED: Self = Self(-3);
    pub const ERROR_DEVICE_LOST: Self = Self(-4);
    pub const ERROR_MEMORY_MAP_FAILED: Self = Self(-5);
    pub const ERROR_UNKNOWN: Self = Self(-13);
    pub const ERROR_OUT_OF_POOL_MEMORY: Self = Self(-1_000_069_000);

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 >= 0
    }

    /// Convert a failing code into `NativeFailure`, keep successes as-is
    #[inline]
    pub fn check(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BridgeError::NativeFailure { code: self })
        }
    }

    pub const fn name(self) -> &'static str {
        match self.0 {
            0 => "SUCCESS",
            1 => "NOT_READY",
            2 => "TIMEOUT",
            3 => "EVENT_SET",
            4 => "EVENT_RESET",
            5 => "INCOMPLETE",
            -1 => "ERROR_OUT_OF_HOST_MEMORY",
            -2 => "ERROR_OUT_OF_DEVICE_MEMORY",
            -3 => "ERROR_INITIALIZATION_FAILED",
            -4 => "ERROR_DEVICE_LOST",
            -5 => "ERROR_MEMORY_MAP_FAILED",
            -13 => "ERROR_UNKNOWN",
            -1_000_069_000 => "ERROR_OUT_OF_POOL_MEMORY",
            _ => "UNRECOGNIZED",
        }
    }
}

impl core::fmt::Display for NativeResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// Errors raised by the marshaling and identity layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Configuration violates a structural invariant (never silently coerced)
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Arena or backing store could not satisfy an allocation
    #[error("out of memory: could not allocate {requested} bytes")]
    OutOfMemory { requested: usize },

    /// The native entry point returned a failing result code
    #[error("native call failed with {code}")]
    NativeFailure { code: NativeResult },

    /// Usage bug in the calling glue
    #[error("invariant violated: {reason}")]
    InvariantViolation { reason: String },
}

impl BridgeError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!(target: "runtime", reason = %reason, "invariant violation");
        Self::InvariantViolation { reason }
    }

    /// Native result code carried by this error, if any
    pub fn native_code(&self) -> Option<NativeResult> {
        match self {
            Self::NativeFailure { code } => Some(*code),
            _ => None,
        }
    }

    /// True for errors that indicate a bug in the caller rather than bad input
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}

pub type Result<T> = core::result::Result<T, BridgeError>;
