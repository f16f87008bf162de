//! Native scalar types shared by every flat record
//!
//! Defines the tag, boolean and handle representations compatible with the
//! native C ABI, plus checked numeric narrowing.

use crate::error::{BridgeError, Result};
use num_traits::{NumCast, ToPrimitive};

/// Structure-type tag stored in the first field of every chained record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct StructureType(pub i32);

impl core::fmt::Display for StructureType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sType({})", self.0)
    }
}

/// 32-bit native boolean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct NativeBool(pub u32);

impl NativeBool {
    pub const FALSE: Self = Self(0);
    pub const TRUE: Self = Self(1);

    /// Any non-zero value reads as true
    #[inline]
    pub const fn as_bool(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for NativeBool {
    #[inline]
    fn from(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }
}

impl From<NativeBool> for bool {
    #[inline]
    fn from(value: NativeBool) -> Self {
        value.as_bool()
    }
}

/// Opaque token identifying a native resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct NativeHandle(pub u64);

impl NativeHandle {
    pub const NULL: Self = Self(0);

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Convert between numeric widths, rejecting values that do not fit
///
/// `field` names the offending field in the error message.
pub fn narrow<T, U>(value: T, field: &str) -> Result<U>
where
    T: ToPrimitive + Copy + core::fmt::Display,
    U: NumCast,
{
    <U as NumCast>::from(value).ok_or_else(|| {
        BridgeError::invalid_argument(format!(
            "{} = {} does not fit the native field width",
            field, value
        ))
    })
}

/// Element count of a collection as the native `u32`
#[inline]
pub fn count_of<T>(items: &[T], field: &str) -> Result<u32> {
    narrow(items.len(), field)
}
