//! Chain marshaling - configuration graph to flat records and back
//!
//! Design: tail first. The next node is marshaled before its parent so that
//! the parent's chain pointer is known when its record is written. Validation
//! of the whole chain runs before the first arena allocation.

use super::header::{self, HEADER_SIZE};
use super::options::{Options, PlainRecord};
use super::types::{count_of, StructureType};
use crate::allocator::Arena;
use crate::error::{BridgeError, Result};
use crate::logging::log_marshal;
use core::alloc::Layout;
use core::any::Any;
use core::ffi::c_void;
use core::ptr::{self, NonNull};
use smallvec::SmallVec;

/// Marshal `options` and its extension chain into `arena`
///
/// Returns the head record. Nothing is allocated if any node fails validation.
pub fn marshal(options: &dyn Options, arena: &mut Arena) -> Result<NonNull<c_void>> {
    let depth = validate_chain(options)?;
    let head = marshal_node(options, arena)?;
    log_marshal(options.structure_type().0, depth, arena.offset());
    Ok(head.cast())
}

/// Marshal an optional nested structure, null when absent
pub fn marshal_nested(options: Option<&dyn Options>, arena: &mut Arena) -> Result<*const c_void> {
    match options {
        Some(options) => marshal(options, arena).map(|p| p.as_ptr() as *const c_void),
        None => Ok(ptr::null()),
    }
}

/// Marshal sibling configuration objects into one contiguous native array
///
/// Each element's extension chain is marshaled separately and linked from
/// the element written in place. An empty slice yields a null pointer and a
/// zero count.
pub fn marshal_slice<O: Options>(items: &[O], arena: &mut Arena) -> Result<(*const c_void, u32)> {
    let Some(first) = items.first() else {
        return Ok((ptr::null(), 0));
    };

    let layout = first.record_layout();
    for item in items {
        if item.record_layout() != layout {
            return Err(BridgeError::invariant(format!(
                "{} elements disagree on record layout",
                item.structure_type()
            )));
        }
        validate_chain(item)?;
    }
    let count = count_of(items, "element count")?;

    check_layout(first.structure_type(), layout)?;
    let stride = layout.pad_to_align().size();
    let array = Layout::from_size_align(stride.saturating_mul(items.len()), layout.align())
        .map_err(|_| BridgeError::OutOfMemory {
            requested: stride.saturating_mul(items.len()),
        })?;
    let region = arena.acquire_layout(array)?;

    for (index, item) in items.iter().enumerate() {
        let next = marshal_next(item, arena)?;
        // Safety: stride * index stays inside the array region
        unsafe {
            let record = NonNull::new_unchecked(region.as_ptr().add(stride * index));
            item.populate_record(arena, record)?;
            header::stamp(record, item.structure_type(), next);
        }
    }

    log_marshal(first.structure_type().0, items.len(), arena.offset());
    Ok((region.as_ptr() as *const c_void, count))
}

fn marshal_node(options: &dyn Options, arena: &mut Arena) -> Result<NonNull<u8>> {
    let next = marshal_next(options, arena)?;

    let layout = options.record_layout();
    check_layout(options.structure_type(), layout)?;
    let region = arena.acquire_layout(layout)?;
    let record = region.as_non_null();

    // Safety: the region is zeroed and sized for `layout`
    unsafe {
        options.populate_record(arena, record)?;
        header::stamp(record, options.structure_type(), next);
    }

    Ok(record)
}

fn marshal_next(options: &dyn Options, arena: &mut Arena) -> Result<*const c_void> {
    match options.next_in_chain() {
        Some(next) => marshal_node(next, arena).map(|p| p.as_ptr() as *const c_void),
        None => Ok(ptr::null()),
    }
}

fn check_layout(s_type: StructureType, layout: Layout) -> Result<()> {
    if layout.size() < HEADER_SIZE || layout.align() < core::mem::align_of::<header::BaseInStructure>() {
        return Err(BridgeError::invariant(format!(
            "{} record layout ({} bytes, align {}) cannot hold a chain header",
            s_type,
            layout.size(),
            layout.align()
        )));
    }
    Ok(())
}

/// Validate every node and return the chain length
pub fn validate_chain(options: &dyn Options) -> Result<usize> {
    let mut depth = 0;
    let mut node = Some(options);
    while let Some(current) = node {
        current.validate()?;
        depth += 1;
        node = current.next_in_chain();
    }
    Ok(depth)
}

/// First node after `options` carrying `s_type`
pub fn find_in_chain(options: &dyn Options, s_type: StructureType) -> Option<&dyn Options> {
    let mut node = options.next_in_chain();
    while let Some(current) = node {
        if current.structure_type() == s_type {
            return Some(current);
        }
        node = current.next_in_chain();
    }
    None
}

/// First extension after `options` whose concrete type is `T`
///
/// Only nodes that expose themselves through `Options::as_any` are seen.
pub fn find_extension<T: Any>(options: &dyn Options) -> Option<&T> {
    let mut node = options.next_in_chain();
    while let Some(current) = node {
        if let Some(found) = current.as_any().and_then(|any| any.downcast_ref::<T>()) {
            return Some(found);
        }
        node = current.next_in_chain();
    }
    None
}

/// Number of nodes in a configuration chain
pub fn chain_depth(options: &dyn Options) -> usize {
    let mut depth = 0;
    let mut node = Some(options);
    while let Some(current) = node {
        depth += 1;
        node = current.next_in_chain();
    }
    depth
}

// ============================================================================
// Output population
// ============================================================================

/// Copy output fields of one record into `options` and return the next record
///
/// # Safety
/// `record` points to an initialized chained record.
pub unsafe fn populate_one(options: &mut dyn Options, record: NonNull<c_void>) -> Result<*const c_void> {
    let record = record.cast::<u8>();
    let prefix = header::read(record);

    if prefix.s_type != options.structure_type() {
        return Err(BridgeError::invariant(format!(
            "populating {} from a native {} record",
            options.structure_type(),
            prefix.s_type
        )));
    }

    options.populate_out(record)?;
    Ok(prefix.p_next)
}

/// Populate `options` and its whole chain from a native-filled chain
///
/// The configuration chain and the native chain must have the same depth.
///
/// # Safety
/// `record` points to an initialized chained record whose chain pointers are
/// valid or null.
pub unsafe fn populate(options: &mut dyn Options, record: *const c_void) -> Result<()> {
    populate_at(options, record, 0)
}

unsafe fn populate_at(options: &mut dyn Options, record: *const c_void, depth: usize) -> Result<()> {
    let Some(record) = NonNull::new(record as *mut c_void) else {
        return Err(BridgeError::invariant(format!(
            "configuration chain continues at depth {} but the native chain ended",
            depth
        )));
    };

    let next_record = populate_one(options, record)?;

    match options.next_in_chain_mut() {
        Some(next) => populate_at(next, next_record, depth + 1),
        None if next_record.is_null() => Ok(()),
        None => Err(BridgeError::invariant(format!(
            "native chain continues at depth {} past the end of the configuration chain",
            depth + 1
        ))),
    }
}

/// Populate each element from a contiguous native array
///
/// # Safety
/// `records` points to `items.len()` initialized records laid out with the
/// first element's record stride.
pub unsafe fn populate_slice<O: Options>(items: &mut [O], records: *const c_void) -> Result<()> {
    let Some(first) = items.first() else {
        return Ok(());
    };
    if records.is_null() {
        return Err(BridgeError::invariant("populating a slice from a null native array"));
    }

    let stride = first.record_layout().pad_to_align().size();
    for (index, item) in items.iter_mut().enumerate() {
        let record = (records as *const u8).add(stride * index) as *const c_void;
        populate(item, record)?;
    }
    Ok(())
}

// ============================================================================
// Arrays
// ============================================================================

/// Copy a slice into a contiguous arena array
///
/// An empty slice yields a null pointer and a zero count.
pub fn alloc_slice<T: Copy>(arena: &mut Arena, items: &[T]) -> Result<(*const T, u32)> {
    if items.is_empty() {
        return Ok((ptr::null(), 0));
    }
    let count = count_of(items, "array length")?;

    let region = arena.acquire_array::<T>(items.len())?;
    let dst = region.cast::<T>();
    // Safety: the region holds `items.len()` properly aligned `T`s
    unsafe { ptr::copy_nonoverlapping(items.as_ptr(), dst, items.len()) };

    Ok((dst as *const T, count))
}

/// Convert plain records and copy them into a contiguous arena array
pub fn alloc_plain_slice<P: PlainRecord>(arena: &mut Arena, items: &[P]) -> Result<(*const P::Native, u32)> {
    let natives = items
        .iter()
        .map(P::to_native)
        .collect::<Result<SmallVec<[P::Native; 8]>>>()?;
    alloc_slice(arena, natives.as_slice())
}

/// Allocate a zeroed output array of `count` elements for the native side to fill
pub fn alloc_output<T: Copy>(arena: &mut Arena, count: usize) -> Result<*mut T> {
    if count == 0 {
        return Ok(ptr::null_mut());
    }
    Ok(arena.acquire_array::<T>(count)?.cast::<T>())
}

// ============================================================================
// Inspection
// ============================================================================

/// Structure-type tags of a native chain, head first
///
/// # Safety
/// `record` is null or points to an initialized chained record whose chain
/// pointers are valid or null.
pub unsafe fn chain_tags(record: *const c_void) -> SmallVec<[StructureType; 4]> {
    let mut tags = SmallVec::new();
    let mut current = record;
    while let Some(node) = NonNull::new(current as *mut u8) {
        let prefix = header::read(node);
        tags.push(prefix.s_type);
        current = prefix.p_next;
    }
    tags
}
