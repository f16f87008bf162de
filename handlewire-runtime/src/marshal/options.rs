//! Configuration object capabilities
//!
//! `Options` is implemented by every chainable configuration object,
//! `PlainRecord` by the small fixed structures that never carry a chain.

use super::types::StructureType;
use crate::allocator::Arena;
use crate::error::Result;
use core::alloc::Layout;
use core::ptr::NonNull;

/// Owned link to the next node of an extension chain
pub type Next = Option<Box<dyn Options>>;

/// A configuration object describing one native record
///
/// Implementations describe their own record (`structure_type`,
/// `record_layout`) and fill in payload fields; tagging and chaining are
/// done by the marshaler.
pub trait Options: core::fmt::Debug {
    /// Tag written into the record header
    fn structure_type(&self) -> StructureType;

    /// Exact size and alignment of the native record, header included
    fn record_layout(&self) -> Layout;

    /// Structural checks run over the whole chain before any allocation
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Length of the per-element array an extension pairs with its parent's batch
    ///
    /// Parents use it to check parallel arrays across chain nodes.
    fn batch_len(&self) -> Option<usize> {
        None
    }

    /// Write payload fields into a zeroed record
    ///
    /// Arrays and nested structures referenced by the record are allocated
    /// from `arena`.
    ///
    /// # Safety
    /// `record` points to `record_layout()` zeroed, writable bytes.
    unsafe fn populate_record(&self, arena: &mut Arena, record: NonNull<u8>) -> Result<()>;

    /// Copy output fields from a native-filled record back into `self`
    ///
    /// # Safety
    /// `record` points to an initialized record of this type.
    unsafe fn populate_out(&mut self, record: NonNull<u8>) -> Result<()> {
        let _ = record;
        Ok(())
    }

    /// Concrete view of this node, so callers can read outputs back out of a chain
    fn as_any(&self) -> Option<&dyn core::any::Any> {
        None
    }

    fn next_in_chain(&self) -> Option<&dyn Options>;

    fn next_in_chain_mut(&mut self) -> Option<&mut (dyn Options + 'static)>;
}

/// A fixed structure copied verbatim into native arrays
pub trait PlainRecord {
    type Native: Copy;

    fn to_native(&self) -> Result<Self::Native>;
}
