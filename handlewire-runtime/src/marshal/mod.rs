//! Chain marshaling - typed configuration objects to native memory
//!
//! Design: Zero-copy where the native layout allows it, arena-backed otherwise
//!
//! Architecture:
//! - `types.rs` - native scalar representations (tags, booleans, handles)
//! - `header.rs` - the tag + chain pointer prefix shared by chained records
//! - `options.rs` - `Options` and `PlainRecord` capabilities
//! - `chain.rs` - marshal, populate and array helpers
//!
//! Every pointer produced here points into an `Arena` and is valid until that
//! arena's next `release_all`.

mod chain;
mod header;
mod options;
mod types;

pub use chain::{
    alloc_output, alloc_plain_slice, alloc_slice, chain_depth, chain_tags, find_extension, find_in_chain, marshal,
    marshal_nested, marshal_slice, populate, populate_one, populate_slice, validate_chain,
};
pub use header::{BaseInStructure, BaseOutStructure, HEADER_SIZE};
pub use options::{Next, Options, PlainRecord};
pub use types::{count_of, narrow, NativeBool, NativeHandle, StructureType};

/// View a zeroed record slot as its native type
///
/// Fields are assigned one by one so padding keeps the arena's zero fill and
/// equal configurations marshal to identical bytes.
///
/// # Safety
/// `record` points to at least `size_of::<T>()` zeroed, writable bytes aligned
/// for `T`, and every all-zero bit pattern is a valid `T`.
#[inline]
pub unsafe fn record_mut<'a, T>(record: core::ptr::NonNull<u8>) -> &'a mut T {
    &mut *record.cast::<T>().as_ptr()
}

/// View a native-filled record
///
/// # Safety
/// `record` points to an initialized `T` that outlives `'a`.
#[inline]
pub unsafe fn record_ref<'a, T>(record: core::ptr::NonNull<u8>) -> &'a T {
    &*record.cast::<T>().as_ptr()
}

#[cfg(test)]
mod tests;
