//! Chain header - the common prefix of every extensible record
//!
//! Every chained record starts with its structure-type tag followed by the
//! pointer to the next record. The marshaler only ever touches this prefix;
//! payload fields belong to the `Options` implementation.

use super::types::StructureType;
use core::ffi::c_void;
use core::ptr::NonNull;

/// Read-only view of a chained input record
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct BaseInStructure {
    pub s_type: StructureType,
    pub p_next: *const c_void,
}

/// Mutable view of a chained output record
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct BaseOutStructure {
    pub s_type: StructureType,
    pub p_next: *mut c_void,
}

/// Smallest record the marshaler will accept
pub const HEADER_SIZE: usize = core::mem::size_of::<BaseInStructure>();

/// Write tag and chain pointer into a record
///
/// # Safety
/// `record` must point to at least `HEADER_SIZE` writable bytes aligned for
/// `BaseInStructure`.
#[inline]
pub unsafe fn stamp(record: NonNull<u8>, s_type: StructureType, next: *const c_void) {
    let header = record.cast::<BaseInStructure>().as_ptr();
    (*header).s_type = s_type;
    (*header).p_next = next;
}

/// Read the prefix of a record
///
/// # Safety
/// `record` must point to a readable, initialized chained record.
#[inline]
pub unsafe fn read(record: NonNull<u8>) -> BaseInStructure {
    core::ptr::read(record.cast::<BaseInStructure>().as_ptr())
}
