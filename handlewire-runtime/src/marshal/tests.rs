//! Chain marshaling tests

use super::*;
use crate::allocator::Arena;
use crate::error::{BridgeError, Result};
use core::alloc::Layout;
use core::ffi::c_void;
use core::ptr::NonNull;
use proptest::prelude::*;

const BASE: StructureType = StructureType(1001);
const EXTENSION: StructureType = StructureType(1002);
const WAIT: StructureType = StructureType(1003);
const OUTPUT: StructureType = StructureType(1004);

// ===== Test Records =====

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct BaseRecord {
    s_type: StructureType,
    p_next: *const c_void,
    flags: u32,
    count: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct ExtensionRecord {
    s_type: StructureType,
    p_next: *const c_void,
    size: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct WaitRecord {
    s_type: StructureType,
    p_next: *const c_void,
    wait_count: u32,
    p_semaphores: *const NativeHandle,
    p_stages: *const u32,
    signal_all: NativeBool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct OutputRecord {
    s_type: StructureType,
    p_next: *mut c_void,
    value: u32,
}

#[derive(Debug, Default)]
struct BaseOptions {
    flags: u32,
    count: usize,
    next: Next,
}

impl Options for BaseOptions {
    fn structure_type(&self) -> StructureType {
        BASE
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<BaseRecord>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let out = record_mut::<BaseRecord>(record);
        out.flags = self.flags;
        out.count = narrow(self.count, "count")?;
        Ok(())
    }

    fn next_in_chain(&self) -> Option<&dyn Options> {
        self.next.as_deref()
    }

    fn next_in_chain_mut(&mut self) -> Option<&mut (dyn Options + 'static)> {
        self.next.as_deref_mut()
    }
}

#[derive(Debug, Default)]
struct ExtensionOptions {
    size: u64,
    next: Next,
}

impl Options for ExtensionOptions {
    fn structure_type(&self) -> StructureType {
        EXTENSION
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<ExtensionRecord>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        record_mut::<ExtensionRecord>(record).size = self.size;
        Ok(())
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }

    fn next_in_chain(&self) -> Option<&dyn Options> {
        self.next.as_deref()
    }

    fn next_in_chain_mut(&mut self) -> Option<&mut (dyn Options + 'static)> {
        self.next.as_deref_mut()
    }
}

#[derive(Debug, Default)]
struct WaitOptions {
    semaphores: Vec<NativeHandle>,
    stages: Vec<u32>,
    signal_all: bool,
    next: Next,
}

impl Options for WaitOptions {
    fn structure_type(&self) -> StructureType {
        WAIT
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<WaitRecord>()
    }

    fn validate(&self) -> Result<()> {
        if self.semaphores.len() != self.stages.len() {
            return Err(BridgeError::invalid_argument(format!(
                "{} wait semaphores but {} wait stages",
                self.semaphores.len(),
                self.stages.len()
            )));
        }
        Ok(())
    }

    unsafe fn populate_record(&self, arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        let (semaphores, count) = alloc_slice(arena, &self.semaphores)?;
        let (stages, _) = alloc_slice(arena, &self.stages)?;

        let out = record_mut::<WaitRecord>(record);
        out.wait_count = count;
        out.p_semaphores = semaphores;
        out.p_stages = stages;
        out.signal_all = self.signal_all.into();
        Ok(())
    }

    fn next_in_chain(&self) -> Option<&dyn Options> {
        self.next.as_deref()
    }

    fn next_in_chain_mut(&mut self) -> Option<&mut (dyn Options + 'static)> {
        self.next.as_deref_mut()
    }
}

#[derive(Debug, Default)]
struct OutputOptions {
    value: u32,
    next: Next,
}

impl Options for OutputOptions {
    fn structure_type(&self) -> StructureType {
        OUTPUT
    }

    fn record_layout(&self) -> Layout {
        Layout::new::<OutputRecord>()
    }

    unsafe fn populate_record(&self, _arena: &mut Arena, record: NonNull<u8>) -> Result<()> {
        record_mut::<OutputRecord>(record).value = self.value;
        Ok(())
    }

    unsafe fn populate_out(&mut self, record: NonNull<u8>) -> Result<()> {
        self.value = record_ref::<OutputRecord>(record).value;
        Ok(())
    }

    fn next_in_chain(&self) -> Option<&dyn Options> {
        self.next.as_deref()
    }

    fn next_in_chain_mut(&mut self) -> Option<&mut (dyn Options + 'static)> {
        self.next.as_deref_mut()
    }
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
struct NativeRect {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl PlainRecord for Rect {
    type Native = NativeRect;

    fn to_native(&self) -> Result<NativeRect> {
        Ok(NativeRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        })
    }
}

/// Output chain of `extensions + 1` nodes holding `values`
fn output_chain(values: &[u32]) -> OutputOptions {
    let mut next: Next = None;
    for &value in values.iter().skip(1).rev() {
        next = Some(Box::new(OutputOptions { value, next }));
    }
    OutputOptions {
        value: values.first().copied().unwrap_or_default(),
        next,
    }
}

/// Values of an output chain, read back from a fresh marshal
fn chain_values(options: &OutputOptions) -> Vec<u32> {
    let mut arena = Arena::new();
    let mut current = marshal(options, &mut arena).unwrap().as_ptr() as *const c_void;
    let mut values = Vec::new();
    while let Some(node) = NonNull::new(current as *mut u8) {
        let record = unsafe { record_ref::<OutputRecord>(node) };
        values.push(record.value);
        current = record.p_next;
    }
    values
}

// ===== Marshal Tests =====

#[test]
fn two_node_chain_layout() {
    let mut arena = Arena::new();
    let options = BaseOptions {
        flags: 0x2,
        count: 3,
        next: Some(Box::new(ExtensionOptions { size: 128, next: None })),
    };

    let head = marshal(&options, &mut arena).unwrap();
    let bytes = head.as_ptr() as *const u8;

    unsafe {
        // Fixed offsets on 64-bit targets: tag 0, chain 8, flags 16, count 20
        assert_eq!(*(bytes as *const i32), BASE.0);
        assert_eq!(*(bytes.add(16) as *const u32), 0x2);
        assert_eq!(*(bytes.add(20) as *const u32), 3);

        let next = *(bytes.add(core::mem::size_of::<usize>()) as *const *const ExtensionRecord);
        assert!(!next.is_null());
        assert_eq!((*next).s_type, EXTENSION);
        assert_eq!((*next).size, 128);
        assert!((*next).p_next.is_null());
    }
}

#[test]
fn chain_order_matches_configuration_order() {
    let mut arena = Arena::new();
    let options = BaseOptions {
        flags: 0,
        count: 0,
        next: Some(Box::new(ExtensionOptions {
            size: 1,
            next: Some(Box::new(OutputOptions::default())),
        })),
    };

    let head = marshal(&options, &mut arena).unwrap();
    let tags = unsafe { chain_tags(head.as_ptr()) };
    assert_eq!(tags.as_slice(), &[BASE, EXTENSION, OUTPUT]);
    assert_eq!(chain_depth(&options), 3);
}

#[test]
fn terminal_record_has_null_chain_pointer() {
    let mut arena = Arena::new();
    let head = marshal(&ExtensionOptions { size: 9, next: None }, &mut arena).unwrap();
    let record = unsafe { record_ref::<ExtensionRecord>(head.cast()) };
    assert!(record.p_next.is_null());
    assert_eq!(record.size, 9);
}

#[test]
fn booleans_and_arrays_are_translated() {
    let mut arena = Arena::new();
    let options = WaitOptions {
        semaphores: vec![NativeHandle(0x10), NativeHandle(0x20)],
        stages: vec![4, 8],
        signal_all: true,
        next: None,
    };

    let head = marshal(&options, &mut arena).unwrap();
    let record = unsafe { record_ref::<WaitRecord>(head.cast()) };

    assert_eq!(record.wait_count, 2);
    assert_eq!(record.signal_all, NativeBool::TRUE);
    unsafe {
        let semaphores = core::slice::from_raw_parts(record.p_semaphores, 2);
        let stages = core::slice::from_raw_parts(record.p_stages, 2);
        assert_eq!(semaphores, &[NativeHandle(0x10), NativeHandle(0x20)]);
        assert_eq!(stages, &[4, 8]);
    }
}

#[test]
fn empty_arrays_are_null_with_zero_count() {
    let mut arena = Arena::new();
    let head = marshal(&WaitOptions::default(), &mut arena).unwrap();
    let record = unsafe { record_ref::<WaitRecord>(head.cast()) };

    assert_eq!(record.wait_count, 0);
    assert!(record.p_semaphores.is_null());
    assert!(record.p_stages.is_null());
    assert_eq!(record.signal_all, NativeBool::FALSE);
}

#[test]
fn mismatched_parallel_arrays_allocate_nothing() {
    let mut arena = Arena::new();
    let options = WaitOptions {
        semaphores: vec![NativeHandle(1), NativeHandle(2), NativeHandle(3)],
        stages: vec![1],
        ..Default::default()
    };

    let err = marshal(&options, &mut arena).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidArgument { .. }));
    assert_eq!(arena.offset(), 0);
}

#[test]
fn invalid_extension_fails_whole_chain_before_allocation() {
    let mut arena = Arena::new();
    let options = BaseOptions {
        flags: 1,
        count: 1,
        next: Some(Box::new(WaitOptions {
            semaphores: vec![NativeHandle(1)],
            ..Default::default()
        })),
    };

    assert!(marshal(&options, &mut arena).is_err());
    assert_eq!(arena.offset(), 0);
}

#[test]
fn narrowing_overflow_is_invalid_argument() {
    let mut arena = Arena::new();
    let options = BaseOptions {
        count: u32::MAX as usize + 1,
        ..Default::default()
    };

    let err = marshal(&options, &mut arena).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidArgument { .. }));
}

#[test]
fn nested_options_marshal_independently() {
    let mut arena = Arena::new();
    let nested = ExtensionOptions { size: 64, next: None };

    let ptr = marshal_nested(Some(&nested), &mut arena).unwrap();
    assert!(!ptr.is_null());
    assert_eq!(unsafe { chain_tags(ptr) }.as_slice(), &[EXTENSION]);

    let absent = marshal_nested(None, &mut arena).unwrap();
    assert!(absent.is_null());
}

#[test]
fn undersized_record_layout_is_invariant_violation() {
    #[derive(Debug)]
    struct Headerless;

    impl Options for Headerless {
        fn structure_type(&self) -> StructureType {
            StructureType(7)
        }
        fn record_layout(&self) -> Layout {
            Layout::new::<u32>()
        }
        unsafe fn populate_record(&self, _arena: &mut Arena, _record: NonNull<u8>) -> Result<()> {
            Ok(())
        }
        fn next_in_chain(&self) -> Option<&dyn Options> {
            None
        }
        fn next_in_chain_mut(&mut self) -> Option<&mut (dyn Options + 'static)> {
            None
        }
    }

    let mut arena = Arena::new();
    let err = marshal(&Headerless, &mut arena).unwrap_err();
    assert!(err.is_programmer_error());
}

// ===== Slice Tests =====

#[test]
fn sibling_objects_form_one_contiguous_array() {
    let mut arena = Arena::new();
    let items = vec![
        BaseOptions { flags: 1, count: 10, next: None },
        BaseOptions {
            flags: 2,
            count: 20,
            next: Some(Box::new(ExtensionOptions { size: 256, next: None })),
        },
        BaseOptions { flags: 3, count: 30, next: None },
    ];

    let (array, count) = marshal_slice(&items, &mut arena).unwrap();
    assert_eq!(count, 3);

    let records = unsafe { core::slice::from_raw_parts(array as *const BaseRecord, 3) };
    assert_eq!(records.iter().map(|r| r.flags).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(records.iter().map(|r| r.count).collect::<Vec<_>>(), vec![10, 20, 30]);
    assert!(records.iter().all(|r| r.s_type == BASE));

    assert!(records[0].p_next.is_null());
    assert!(records[2].p_next.is_null());
    let extension = unsafe { &*(records[1].p_next as *const ExtensionRecord) };
    assert_eq!(extension.size, 256);
}

#[test]
fn empty_slice_is_null() {
    let mut arena = Arena::new();
    let items: Vec<BaseOptions> = Vec::new();
    let (array, count) = marshal_slice(&items, &mut arena).unwrap();
    assert!(array.is_null());
    assert_eq!(count, 0);
    assert_eq!(arena.offset(), 0);
}

#[test]
fn slice_validation_precedes_allocation() {
    let mut arena = Arena::new();
    let items = vec![
        WaitOptions::default(),
        WaitOptions {
            stages: vec![1, 2],
            ..Default::default()
        },
    ];

    assert!(marshal_slice(&items, &mut arena).is_err());
    assert_eq!(arena.offset(), 0);
}

#[test]
fn plain_records_copy_verbatim() {
    let mut arena = Arena::new();
    let rects = [
        Rect { x: 0, y: 0, width: 16, height: 16 },
        Rect { x: -4, y: 8, width: 32, height: 2 },
    ];

    let (ptr, count) = alloc_plain_slice(&mut arena, &rects).unwrap();
    assert_eq!(count, 2);

    let natives = unsafe { core::slice::from_raw_parts(ptr, 2) };
    assert_eq!(natives[1], NativeRect { x: -4, y: 8, width: 32, height: 2 });
}

#[test]
fn output_array_is_zeroed() {
    let mut arena = Arena::new();
    let out = alloc_output::<NativeHandle>(&mut arena, 4).unwrap();
    let handles = unsafe { core::slice::from_raw_parts(out, 4) };
    assert!(handles.iter().all(|h| h.is_null()));

    assert!(alloc_output::<NativeHandle>(&mut arena, 0).unwrap().is_null());
}

// ===== Populate Tests =====

/// Marshal `values`, then populate a zeroed chain of the same depth from it
fn round_trip(values: &[u32]) -> Vec<u32> {
    let mut arena = Arena::new();
    let source = output_chain(values);
    let head = marshal(&source, &mut arena).unwrap();

    let mut target = output_chain(&vec![0; values.len()]);
    unsafe { populate(&mut target, head.as_ptr()).unwrap() };
    chain_values(&target)
}

#[test]
fn populate_round_trips_at_depth_zero_one_and_three() {
    for extensions in [0usize, 1, 3] {
        let values: Vec<u32> = (0..=extensions as u32).map(|i| 100 + i).collect();
        assert_eq!(round_trip(&values), values, "{} extensions", extensions);
    }
}

#[test]
fn populate_one_returns_next_record() {
    let mut arena = Arena::new();
    let source = output_chain(&[1, 2]);
    let head = marshal(&source, &mut arena).unwrap();

    let mut single = OutputOptions::default();
    let next = unsafe { populate_one(&mut single, head).unwrap() };
    assert_eq!(single.value, 1);
    assert!(!next.is_null());
    assert_eq!(unsafe { chain_tags(next) }.as_slice(), &[OUTPUT]);
}

#[test]
fn configuration_deeper_than_native_chain_fails() {
    let mut arena = Arena::new();
    let head = marshal(&output_chain(&[1]), &mut arena).unwrap();

    let mut deeper = output_chain(&[0, 0]);
    let err = unsafe { populate(&mut deeper, head.as_ptr()) }.unwrap_err();
    assert!(err.is_programmer_error());
}

#[test]
fn native_chain_deeper_than_configuration_fails() {
    let mut arena = Arena::new();
    let head = marshal(&output_chain(&[1, 2, 3]), &mut arena).unwrap();

    let mut shallower = output_chain(&[0]);
    let err = unsafe { populate(&mut shallower, head.as_ptr()) }.unwrap_err();
    assert!(err.is_programmer_error());
}

#[test]
fn populate_rejects_mismatched_record_type() {
    let mut arena = Arena::new();
    let head = marshal(&ExtensionOptions { size: 1, next: None }, &mut arena).unwrap();

    let mut options = OutputOptions::default();
    let err = unsafe { populate(&mut options, head.as_ptr()) }.unwrap_err();
    assert!(err.is_programmer_error());
}

#[test]
fn populate_slice_walks_array_stride() {
    let mut arena = Arena::new();
    let source = vec![output_chain(&[5]), output_chain(&[6, 7])];
    let (array, _) = marshal_slice(&source, &mut arena).unwrap();

    let mut targets = vec![output_chain(&[0]), output_chain(&[0, 0])];
    unsafe { populate_slice(&mut targets, array).unwrap() };

    assert_eq!(chain_values(&targets[0]), vec![5]);
    assert_eq!(chain_values(&targets[1]), vec![6, 7]);
}

// ===== Determinism =====

fn payload_bytes(head: NonNull<c_void>) -> Vec<u8> {
    let bytes = unsafe {
        core::slice::from_raw_parts(head.as_ptr() as *const u8, core::mem::size_of::<BaseRecord>())
    };
    // Skip the chain pointer, which differs between arenas
    let mut out = bytes[..4].to_vec();
    out.extend_from_slice(&bytes[HEADER_SIZE..]);
    out
}

proptest! {
    #[test]
    fn prop_populate_round_trips(values in prop::collection::vec(any::<u32>(), 1..6)) {
        prop_assert_eq!(round_trip(&values), values);
    }

    #[test]
    fn prop_equal_configurations_marshal_identically(flags in any::<u32>(), count in any::<u32>()) {
        let mut first = Arena::new();
        let mut second = Arena::new();
        let a = BaseOptions { flags, count: count as usize, next: None };
        let b = BaseOptions { flags, count: count as usize, next: None };

        let ha = marshal(&a, &mut first).unwrap();
        let hb = marshal(&b, &mut second).unwrap();
        prop_assert_eq!(payload_bytes(ha), payload_bytes(hb));
        prop_assert_eq!(first.offset(), second.offset());
    }
}

// ===== Narrowing =====

#[test]
fn narrow_accepts_values_in_range() {
    let value: u32 = narrow(42usize, "field").unwrap();
    assert_eq!(value, 42);
    let value: i32 = narrow(-5i64, "field").unwrap();
    assert_eq!(value, -5);
}

#[test]
fn narrow_rejects_values_out_of_range() {
    let err = narrow::<i64, u32>(-1, "offset").unwrap_err();
    assert!(err.to_string().contains("offset = -1"));
}

// ===== Chain Lookup =====

#[test]
fn find_in_chain_skips_head() {
    let options = ExtensionOptions {
        size: 1,
        next: Some(Box::new(BaseOptions {
            flags: 0,
            count: 0,
            next: Some(Box::new(ExtensionOptions { size: 2, next: None })),
        })),
    };

    assert_eq!(find_in_chain(&options, BASE).map(|o| o.structure_type()), Some(BASE));
    assert!(find_in_chain(&options, EXTENSION).is_some());
    assert!(find_in_chain(&options, OUTPUT).is_none());
    assert_eq!(options.batch_len(), None);
}

#[test]
fn find_extension_downcasts_first_match() {
    let options = BaseOptions {
        flags: 0,
        count: 0,
        next: Some(Box::new(ExtensionOptions {
            size: 64,
            next: Some(Box::new(ExtensionOptions { size: 128, next: None })),
        })),
    };

    let found = find_extension::<ExtensionOptions>(&options).map(|ext| ext.size);
    assert_eq!(found, Some(64));
    // Nodes that do not expose themselves are invisible
    assert!(find_extension::<BaseOptions>(&options).is_none());
}
