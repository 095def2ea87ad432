/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Call frames: fixed-capacity argument buffers for one outbound `ptrcall`.
//!
//! A frame is a plain stack value. Arguments are either moved inline into one of its slots (scalars, vectors,
//! object pointers, temporary native strings) or borrowed by pointer for the frame's lifetime `'a`. The return slot is
//! reserved and default-initialized before the call, so the engine always writes into a valid value.
//!
//! Dropping a frame runs the drop glue of every inline argument and of an unread return value, so each exit path
//! (including unwinding) releases temporaries exactly once.

use std::any::type_name;
use std::marker::PhantomData;
use std::mem::{self, align_of, size_of, MaybeUninit};
use std::ptr;

use crate as sys;
use crate::ReturnOwnership;

/// Maximum number of arguments of a single call.
pub const FRAME_CAPACITY: usize = 16;

/// Size in bytes of one argument slot.
pub const SLOT_SIZE: usize = 64;

/// Alignment of every argument slot.
pub const SLOT_ALIGN: usize = 16;

type DropFn = unsafe fn(*mut u8);
type DiscardFn = unsafe fn(*mut u8, &ReturnMeta);

#[repr(C, align(16))]
struct Slot(MaybeUninit<[u8; SLOT_SIZE]>);

impl Slot {
    const VACANT: Slot = Slot(MaybeUninit::uninit());

    fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr() as *const u8
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.0.as_mut_ptr() as *mut u8
    }
}

sys::static_assert!(align_of::<Slot>() == SLOT_ALIGN);
sys::static_assert!(size_of::<Slot>() == SLOT_SIZE);

#[derive(Copy, Clone)]
enum SlotState {
    Vacant,
    Inline(Option<DropFn>),
    Borrowed(sys::GDExtensionConstTypePtr),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum ReturnState {
    Absent,
    Reserved,
    Filled,
    Taken,
}

/// Return metadata recorded by the dispatcher after the native call.
#[derive(Copy, Clone, Debug)]
pub struct ReturnMeta {
    /// How the returned object, if any, is owned.
    pub ownership: ReturnOwnership,

    /// Object the method was called on; parent of `BoundToReceiver` results.
    pub receiver: sys::GDExtensionObjectPtr,
}

/// Typed marker for a reserved return slot, redeemed once with [`CallFrame::get()`].
#[must_use = "the return value must be read with CallFrame::get()"]
pub struct Ret<T> {
    _marker: PhantomData<fn() -> T>,
}

/// Argument buffer for one native call.
pub struct CallFrame<'a> {
    slots: [Slot; FRAME_CAPACITY],
    states: [SlotState; FRAME_CAPACITY],
    arity: usize,
    written: usize,
    dispatched: bool,

    ret_slot: Slot,
    ret_state: ReturnState,
    ret_type: &'static str,
    ret_drop_raw: Option<DropFn>,
    ret_discard: Option<DiscardFn>,
    ret_meta: Option<ReturnMeta>,

    _borrows: PhantomData<&'a ()>,
}

impl<'a> CallFrame<'a> {
    /// Creates an empty frame for a call with exactly `arity` arguments.
    ///
    /// # Panics
    /// If `arity` exceeds [`FRAME_CAPACITY`].
    pub fn new(arity: usize) -> Self {
        assert!(
            arity <= FRAME_CAPACITY,
            "call frame arity {arity} exceeds capacity {FRAME_CAPACITY}"
        );

        Self {
            slots: [Slot::VACANT; FRAME_CAPACITY],
            states: [SlotState::Vacant; FRAME_CAPACITY],
            arity,
            written: 0,
            dispatched: false,
            ret_slot: Slot::VACANT,
            ret_state: ReturnState::Absent,
            ret_type: "()",
            ret_drop_raw: None,
            ret_discard: None,
            ret_meta: None,
            _borrows: PhantomData,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of arguments written so far.
    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Encodes the next argument.
    ///
    /// # Panics
    /// If more arguments are written than the frame's arity.
    pub fn arg<A: FrameArg<'a>>(&mut self, value: A) -> &mut Self {
        value.write_arg(self);
        self
    }

    /// Moves `value` into the next slot. The slot's address is what the engine receives.
    pub fn push_inline<T: 'a>(&mut self, value: T) {
        const {
            assert!(size_of::<T>() <= SLOT_SIZE, "argument does not fit into a call frame slot");
            assert!(align_of::<T>() <= SLOT_ALIGN, "argument alignment exceeds call frame slot alignment");
        }

        let index = self.next_index();

        // SAFETY: slot is large and aligned enough (checked above) and currently vacant.
        unsafe { ptr::write(self.slots[index].as_mut_ptr() as *mut T, value) };

        let drop_fn = mem::needs_drop::<T>().then_some(drop_erased::<T> as DropFn);
        self.states[index] = SlotState::Inline(drop_fn);
        self.written += 1;
    }

    /// Passes `value` by pointer; the frame borrows it for `'a`.
    pub fn push_ref<T>(&mut self, value: &'a T) {
        let index = self.next_index();

        self.states[index] = SlotState::Borrowed(value as *const T as sys::GDExtensionConstTypePtr);
        self.written += 1;
    }

    /// Reserves and default-initializes the typed return slot.
    ///
    /// # Panics
    /// If a return slot was already reserved.
    pub fn ret<T: FrameRet>(&mut self) -> Ret<T> {
        const {
            assert!(size_of::<T::Raw>() <= SLOT_SIZE, "return value does not fit into a call frame slot");
            assert!(align_of::<T::Raw>() <= SLOT_ALIGN, "return alignment exceeds call frame slot alignment");
        }
        assert_eq!(
            self.ret_state,
            ReturnState::Absent,
            "call frame return slot reserved twice"
        );

        // SAFETY: size and alignment checked above; slot is unused.
        unsafe { ptr::write(self.ret_slot.as_mut_ptr() as *mut T::Raw, T::raw_default()) };

        self.ret_state = ReturnState::Reserved;
        self.ret_type = type_name::<T>();
        self.ret_drop_raw = mem::needs_drop::<T::Raw>().then_some(drop_erased::<T::Raw> as DropFn);
        self.ret_discard = Some(discard_erased::<T>);

        Ret {
            _marker: PhantomData,
        }
    }

    /// Decodes the return slot, applying the ownership recorded by the dispatcher.
    ///
    /// # Panics
    /// If called before the frame was dispatched.
    pub fn get<T: FrameRet>(&mut self, ret: Ret<T>) -> T {
        let Ret { _marker } = ret;

        match self.ret_state {
            ReturnState::Filled => {}
            ReturnState::Reserved => panic!("call frame return slot read before dispatch"),
            ReturnState::Taken => panic!("call frame return slot read twice"),
            ReturnState::Absent => panic!("call frame has no reserved return slot"),
        }
        debug_assert_eq!(self.ret_type, type_name::<T>(), "return slot type mismatch");

        let Some(meta) = self.ret_meta else {
            unreachable!("filled return slot without return metadata");
        };

        // SAFETY: state Filled means the slot holds an initialized T::Raw, written in ret() and updated by the engine.
        let raw = unsafe { ptr::read(self.ret_slot.as_ptr() as *const T::Raw) };
        self.ret_state = ReturnState::Taken;

        // SAFETY: raw value was produced by the engine for this method's return type.
        unsafe { T::decode(raw, &meta) }
    }

    /// Releases all temporaries of the frame. Same as dropping it.
    pub fn free(self) {
        drop(self);
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Dispatcher interface

    /// Argument pointers in declared order, followed by null entries.
    ///
    /// # Panics
    /// If fewer arguments than declared were written, or the frame was already dispatched.
    #[doc(hidden)]
    pub fn sys_args(&self) -> [sys::GDExtensionConstTypePtr; FRAME_CAPACITY] {
        assert!(!self.dispatched, "call frame dispatched twice");
        assert_eq!(
            self.written, self.arity,
            "call frame declares {} arguments, but {} were written",
            self.arity, self.written
        );

        let mut ptrs = [ptr::null(); FRAME_CAPACITY];
        for (index, state) in self.states[..self.written].iter().enumerate() {
            ptrs[index] = match *state {
                SlotState::Inline(_) => self.slots[index].as_ptr() as sys::GDExtensionConstTypePtr,
                SlotState::Borrowed(ptr) => ptr,
                SlotState::Vacant => unreachable!("written slot {index} is vacant"),
            };
        }

        ptrs
    }

    /// Pointer to the reserved return slot, or null for calls without return value.
    #[doc(hidden)]
    pub fn sys_ret(&mut self) -> sys::GDExtensionTypePtr {
        match self.ret_state {
            ReturnState::Reserved => self.ret_slot.as_mut_ptr() as sys::GDExtensionTypePtr,
            ReturnState::Absent => ptr::null_mut(),
            ReturnState::Filled | ReturnState::Taken => panic!("call frame dispatched twice"),
        }
    }

    /// Records that the native call completed.
    #[doc(hidden)]
    pub fn mark_returned(&mut self, meta: ReturnMeta) {
        assert!(!self.dispatched, "call frame dispatched twice");

        self.dispatched = true;
        self.ret_meta = Some(meta);
        if self.ret_state == ReturnState::Reserved {
            self.ret_state = ReturnState::Filled;
        }
    }

    fn next_index(&self) -> usize {
        let index = self.written;
        if index >= self.arity {
            panic!(
                "call frame overflow: declared arity {}, attempted to write argument #{index}",
                self.arity
            );
        }

        index
    }
}

impl Drop for CallFrame<'_> {
    fn drop(&mut self) {
        for index in 0..self.written {
            if let SlotState::Inline(Some(drop_fn)) = self.states[index] {
                // SAFETY: inline slot holds an initialized value of the type drop_fn was instantiated with.
                unsafe { drop_fn(self.slots[index].as_mut_ptr()) };
            }
            self.states[index] = SlotState::Vacant;
        }

        match (self.ret_state, self.ret_meta) {
            // Unread result: decode it so that owned results are released like any other handle.
            (ReturnState::Filled, Some(meta)) => {
                if let Some(discard) = self.ret_discard {
                    // SAFETY: slot holds the engine-written raw value of the reserved type.
                    unsafe { discard(self.ret_slot.as_mut_ptr(), &meta) };
                }
            }
            (ReturnState::Reserved, _) | (ReturnState::Filled, None) => {
                if let Some(drop_fn) = self.ret_drop_raw {
                    // SAFETY: slot holds the default value written in ret().
                    unsafe { drop_fn(self.ret_slot.as_mut_ptr()) };
                }
            }
            (ReturnState::Absent | ReturnState::Taken, _) => {}
        }
        self.ret_state = ReturnState::Absent;
    }
}

unsafe fn drop_erased<T>(ptr: *mut u8) {
    ptr::drop_in_place(ptr as *mut T);
}

unsafe fn discard_erased<T: FrameRet>(ptr: *mut u8, meta: &ReturnMeta) {
    let raw = ptr::read(ptr as *const T::Raw);
    drop(T::decode(raw, meta));
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Marshaling traits

/// Value that can be passed as argument of an outbound call.
pub trait FrameArg<'a> {
    /// Encodes `self` as the next argument of `frame`, usually via [`CallFrame::push_inline()`] or
    /// [`CallFrame::push_ref()`].
    fn write_arg(self, frame: &mut CallFrame<'a>);
}

/// Value that can be returned from an outbound call.
pub trait FrameRet: Sized {
    /// Representation the engine writes into the return slot.
    type Raw;

    /// Value the return slot holds before the call.
    fn raw_default() -> Self::Raw;

    /// # Safety
    /// `raw` must have been written by the engine as the return value of a call described by `meta`.
    unsafe fn decode(raw: Self::Raw, meta: &ReturnMeta) -> Self;
}

/// Object handle that can be returned from a call. `Option<T>` maps null results to `None`.
pub trait FrameRetObject: Sized {
    /// # Safety
    /// `ptr` must be a non-null, live object returned by the engine with ownership `meta.ownership`.
    unsafe fn from_ret_object(ptr: sys::GDExtensionObjectPtr, meta: &ReturnMeta) -> Self;
}

/// Object handle that can be passed to a call. `Option<&T>` passes `None` as null.
pub trait FrameArgObject {
    fn arg_object_ptr(&self) -> sys::GDExtensionObjectPtr;
}

impl<T: FrameRetObject> FrameRet for Option<T> {
    type Raw = sys::GDExtensionObjectPtr;

    fn raw_default() -> Self::Raw {
        ptr::null_mut()
    }

    unsafe fn decode(raw: Self::Raw, meta: &ReturnMeta) -> Self {
        sys::ptr_then(raw, |ptr| T::from_ret_object(ptr, meta))
    }
}

impl<'a, T: FrameArgObject> FrameArg<'a> for Option<&'a T> {
    fn write_arg(self, frame: &mut CallFrame<'a>) {
        let ptr = match self {
            Some(object) => object.arg_object_ptr(),
            None => ptr::null_mut(),
        };
        frame.push_inline(ptr);
    }
}

macro_rules! impl_frame_numeric {
    ($($T:ty => $Raw:ty),* $(,)?) => {
        $(
            impl<'a> FrameArg<'a> for $T {
                fn write_arg(self, frame: &mut CallFrame<'a>) {
                    frame.push_inline(self as $Raw);
                }
            }

            impl FrameRet for $T {
                type Raw = $Raw;

                fn raw_default() -> $Raw {
                    <$Raw>::default()
                }

                unsafe fn decode(raw: $Raw, _meta: &ReturnMeta) -> Self {
                    raw as $T
                }
            }
        )*
    };
}

// Engine ptrcalls use 64-bit integers and doubles for every int/float parameter.
impl_frame_numeric! {
    i64 => i64,
    i32 => i64,
    f64 => f64,
    f32 => f64,
}

impl<'a> FrameArg<'a> for bool {
    fn write_arg(self, frame: &mut CallFrame<'a>) {
        frame.push_inline(sys::conv::bool_to_sys(self));
    }
}

impl FrameRet for bool {
    type Raw = sys::GDExtensionBool;

    fn raw_default() -> Self::Raw {
        sys::conv::SYS_FALSE
    }

    unsafe fn decode(raw: Self::Raw, _meta: &ReturnMeta) -> Self {
        sys::conv::bool_from_sys(raw)
    }
}

impl FrameRet for () {
    type Raw = ();

    fn raw_default() -> Self::Raw {}

    unsafe fn decode(_raw: (), _meta: &ReturnMeta) -> Self {}
}

/// Passes a Rust string as a temporary native `String`, destroyed together with the frame.
impl<'a> FrameArg<'a> for &str {
    fn write_arg(self, frame: &mut CallFrame<'a>) {
        frame.push_inline(TempString::new(self));
    }
}

#[repr(transparent)]
struct TempString(sys::OpaqueString);

impl TempString {
    fn new(text: &str) -> Self {
        let mut opaque = sys::OpaqueString::zeroed();

        // SAFETY: destination is writable storage of the right size; the engine initializes it.
        unsafe {
            sys::interface_fn!(string_new_with_utf8_chars_and_len)(
                opaque.as_mut_ptr(),
                text.as_ptr() as *const std::ffi::c_char,
                text.len() as sys::GDExtensionInt,
            );
        }

        Self(opaque)
    }
}

impl Drop for TempString {
    fn drop(&mut self) {
        // SAFETY: initialized by the engine in new().
        unsafe { sys::builtin_fn!(string_destroy)(self.0.as_mut_ptr()) };
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn meta() -> ReturnMeta {
        ReturnMeta {
            ownership: ReturnOwnership::Owned,
            receiver: ptr::null_mut(),
        }
    }

    // Emulates the engine side of a ptrcall that adds its two integer arguments.
    unsafe fn fake_add(frame: &mut CallFrame<'_>) {
        let args = frame.sys_args();
        let lhs = *(args[0] as *const i64);
        let rhs = *(args[1] as *const i64);

        let ret = frame.sys_ret() as *mut i64;
        *ret = lhs + rhs;
        frame.mark_returned(meta());
    }

    #[test]
    fn frame_marshals_inline_arguments() {
        let mut frame = CallFrame::new(2);
        frame.arg(40i32).arg(2i64);
        let ret = frame.ret::<i64>();

        unsafe { fake_add(&mut frame) };
        assert_eq!(frame.get(ret), 42);
    }

    #[test]
    fn frame_passes_references_by_address() {
        let value = 7i64;
        let mut frame = CallFrame::new(1);
        frame.push_ref(&value);

        let args = frame.sys_args();
        assert_eq!(args[0], &value as *const i64 as sys::GDExtensionConstTypePtr);
        assert!(args[1].is_null());
    }

    #[test]
    fn frame_bool_and_float_encoding() {
        let mut frame = CallFrame::new(2);
        frame.arg(true).arg(1.5f32);

        let args = frame.sys_args();
        unsafe {
            assert_eq!(*(args[0] as *const u8), 1);
            assert_eq!(*(args[1] as *const f64), 1.5);
        }
    }

    #[test]
    fn frame_accepts_full_capacity() {
        let mut frame = CallFrame::new(FRAME_CAPACITY);
        for i in 0..FRAME_CAPACITY {
            frame.arg(i as i64);
        }

        let args = frame.sys_args();
        assert_eq!(unsafe { *(args[FRAME_CAPACITY - 1] as *const i64) }, 15);
    }

    #[test]
    #[should_panic(expected = "call frame arity 17 exceeds capacity 16")]
    fn frame_arity_above_capacity_panics() {
        let _frame = CallFrame::new(FRAME_CAPACITY + 1);
    }

    #[test]
    #[should_panic(expected = "call frame overflow: declared arity 1, attempted to write argument #1")]
    fn frame_overflow_panics() {
        let mut frame = CallFrame::new(1);
        frame.arg(1i64);
        frame.arg(2i64);
    }

    #[test]
    #[should_panic(expected = "declares 2 arguments, but 1 were written")]
    fn frame_dispatch_with_missing_arguments_panics() {
        let mut frame = CallFrame::new(2);
        frame.arg(1i64);
        frame.sys_args();
    }

    #[test]
    #[should_panic(expected = "return slot read before dispatch")]
    fn frame_read_before_dispatch_panics() {
        let mut frame = CallFrame::new(0);
        let ret = frame.ret::<i64>();
        frame.get(ret);
    }

    #[test]
    fn frame_reserved_return_is_default() {
        let mut frame = CallFrame::new(0);
        let _ret = frame.ret::<bool>();
        let slot = frame.sys_ret() as *const u8;

        assert_eq!(unsafe { *slot }, 0);
    }

    struct DropCounter<'c>(&'c Cell<u32>);

    impl Drop for DropCounter<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn frame_drops_inline_temporaries_once() {
        let drops = Cell::new(0);
        {
            let mut frame = CallFrame::new(2);
            frame.push_inline(DropCounter(&drops));
            frame.push_inline(DropCounter(&drops));
            assert_eq!(drops.get(), 0);
        }
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn frame_drops_temporaries_on_unwind() {
        let drops = Cell::new(0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut frame = CallFrame::new(1);
            frame.push_inline(DropCounter(&drops));
            frame.arg(5i64); // overflow
        }));

        assert!(result.is_err());
        assert_eq!(drops.get(), 1);
    }
}
