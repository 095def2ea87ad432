/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Trampolines: entry points through which the engine calls virtual methods implemented in Rust.
//!
//! Each call runs inside a [`Scope`]. Arguments are decoded through [`VirtualArgs`], the user method is invoked on the
//! bound instance, and the result is written into the engine's return slot. Payload arguments passed by reference are
//! retained in the scope and released when it closes, on every path.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::ptr;

use gdbind_ffi as sys;
use sys::{interface_fn, GodotFfi, PtrcallType};

use crate::builtin::{Array, Color, Dictionary, GString, StringName, Variant, Vector2, Vector3};
use crate::meta::CallContext;
use crate::obj::{Gd, GodotClass, Memory, UserClass};
use crate::private::handle_panic;
use crate::storage::as_storage;

/// Lifecycle phases of a [`Scope`], in the only order they may occur.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum ScopePhase {
    Opened,
    ArgsDecoded,
    ImplInvoked,
    ResultEncoded,
    Closed,
}

impl ScopePhase {
    fn next(self) -> Option<Self> {
        match self {
            Self::Opened => Some(Self::ArgsDecoded),
            Self::ArgsDecoded => Some(Self::ImplInvoked),
            Self::ImplInvoked => Some(Self::ResultEncoded),
            Self::ResultEncoded => Some(Self::Closed),
            Self::Closed => None,
        }
    }
}

/// RAII scope of one inbound call.
///
/// Retains temporary handles for the duration of the call; closing the scope (on drop) releases them.
pub struct Scope {
    context: CallContext<'static>,
    phase: Cell<ScopePhase>,
    retained: RefCell<Vec<Box<dyn Any>>>,
}

impl Scope {
    pub fn open(class_name: &'static str, method_name: &'static str) -> Self {
        sys::out!("scope open  {class_name}::{method_name}");

        Self {
            context: CallContext::func(class_name, method_name),
            phase: Cell::new(ScopePhase::Opened),
            retained: RefCell::new(Vec::new()),
        }
    }

    pub fn phase(&self) -> ScopePhase {
        self.phase.get()
    }

    pub fn context(&self) -> CallContext<'static> {
        self.context
    }

    /// Moves to phase `to`, which must directly follow the current phase.
    ///
    /// # Panics
    /// If `to` is not the next phase.
    pub fn advance(&self, to: ScopePhase) {
        let from = self.phase.get();
        assert_eq!(
            from.next(),
            Some(to),
            "{}: scope phase {to:?} cannot follow {from:?}",
            self.context
        );

        self.phase.set(to);
    }

    /// Keeps `value` alive until the scope closes and lends it out for the scope's lifetime.
    pub fn retain<T: 'static>(&self, value: T) -> &T {
        assert_eq!(
            self.phase.get(),
            ScopePhase::Opened,
            "{}: arguments can only be retained while decoding",
            self.context
        );

        let boxed = Box::new(value);
        let value_ptr: *const T = &*boxed;
        self.retained.borrow_mut().push(boxed);

        // SAFETY: the box's heap allocation does not move when the vector grows, and boxes are only dropped together
        // with the scope, which outlives the returned reference.
        unsafe { &*value_ptr }
    }

    /// Number of handles currently retained.
    pub fn retained_count(&self) -> usize {
        self.retained.borrow().len()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        // Also reached from earlier phases when unwinding; retained handles are released either way.
        self.phase.set(ScopePhase::Closed);

        let retained = std::mem::take(self.retained.get_mut());
        sys::out!("scope close {} ({} retained)", self.context, retained.len());
        drop(retained);
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("context", &self.context.to_string())
            .field("phase", &self.phase.get())
            .field("retained", &self.retained_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Arguments

/// Arguments of one inbound call, decoded on demand.
pub struct VirtualArgs<'s> {
    scope: &'s Scope,
    args: *const sys::GDExtensionConstTypePtr,
    arity: usize,
}

impl<'s> VirtualArgs<'s> {
    /// # Safety
    /// `args` must point to `arity` valid argument pointers that outlive the scope.
    pub unsafe fn new(scope: &'s Scope, args: *const sys::GDExtensionConstTypePtr, arity: usize) -> Self {
        Self { scope, args, arity }
    }

    /// Decodes argument `index` as `T`.
    ///
    /// # Panics
    /// If `index` is out of range, or decoding is already finished.
    pub fn arg<T: FromVirtualArg<'s>>(&self, index: usize) -> T {
        assert!(
            index < self.arity,
            "{}: argument index {index} out of range for {} arguments",
            self.scope.context,
            self.arity
        );

        // SAFETY: index in range; the engine passes arguments matching the virtual method's signature.
        unsafe { T::from_virtual_arg(*self.args.add(index), self.scope) }
    }

    /// Marks all arguments as decoded.
    pub fn finish(&self) {
        self.scope.advance(ScopePhase::ArgsDecoded);
    }
}

/// Type that can be decoded from a virtual-call argument.
///
/// By-value types become Rust values. References to payload types (`&GString`, `&Array`, …) are borrowed handles that
/// live in the call's [`Scope`] and cannot escape it.
pub trait FromVirtualArg<'s>: Sized {
    /// # Safety
    /// `ptr` must point to a value of the engine type corresponding to `Self`.
    unsafe fn from_virtual_arg(ptr: sys::GDExtensionConstTypePtr, scope: &'s Scope) -> Self;
}

macro_rules! impl_virtual_arg_copy {
    ($($T:ty => $Raw:ty),* $(,)?) => {
        $(
            impl<'s> FromVirtualArg<'s> for $T {
                unsafe fn from_virtual_arg(ptr: sys::GDExtensionConstTypePtr, _scope: &'s Scope) -> Self {
                    *(ptr as *const $Raw) as $T
                }
            }
        )*
    };
}

impl_virtual_arg_copy! {
    i64 => i64,
    i32 => i64,
    f64 => f64,
    f32 => f64,
}

impl<'s> FromVirtualArg<'s> for bool {
    unsafe fn from_virtual_arg(ptr: sys::GDExtensionConstTypePtr, _scope: &'s Scope) -> Self {
        sys::conv::bool_from_sys(*(ptr as *const sys::GDExtensionBool))
    }
}

macro_rules! impl_virtual_arg_pod {
    ($($T:ty),* $(,)?) => {
        $(
            impl<'s> FromVirtualArg<'s> for $T {
                unsafe fn from_virtual_arg(ptr: sys::GDExtensionConstTypePtr, _scope: &'s Scope) -> Self {
                    *(ptr as *const $T)
                }
            }
        )*
    };
}

impl_virtual_arg_pod!(Vector2, Vector3, Color);

macro_rules! impl_virtual_arg_payload {
    ($($T:ident),* $(,)?) => {
        $(
            /// Borrowed handle, retained by the scope.
            impl<'s> FromVirtualArg<'s> for &'s $T {
                unsafe fn from_virtual_arg(ptr: sys::GDExtensionConstTypePtr, scope: &'s Scope) -> Self {
                    scope.retain($T::from_sys_borrowed(ptr))
                }
            }

            /// Owned copy.
            impl<'s> FromVirtualArg<'s> for $T {
                unsafe fn from_virtual_arg(ptr: sys::GDExtensionConstTypePtr, _scope: &'s Scope) -> Self {
                    <$T as GodotFfi>::new_from_sys(ptr)
                }
            }
        )*
    };
}

impl_virtual_arg_payload!(GString, StringName, Variant, Array, Dictionary);

/// Reads an object argument: reference-counted classes are passed as `Ref<T>*`, all others as `Object**`.
unsafe fn read_object_arg<T: GodotClass>(ptr: sys::GDExtensionConstTypePtr) -> sys::GDExtensionObjectPtr {
    if <T::Memory as Memory>::IS_REF_COUNTED == Some(true) {
        interface_fn!(ref_get_object)(ptr)
    } else {
        *(ptr as *const sys::GDExtensionObjectPtr)
    }
}

impl<'s, T: GodotClass> FromVirtualArg<'s> for Option<Gd<T>> {
    unsafe fn from_virtual_arg(ptr: sys::GDExtensionConstTypePtr, _scope: &'s Scope) -> Self {
        let raw = read_object_arg::<T>(ptr);

        // The engine keeps its own reference; cloning takes ours (or yields a borrowed handle for manual objects).
        sys::ptr_then(raw, |raw| Gd::<T>::from_obj_sys_borrowed(raw).clone())
    }
}

impl<'s, T: GodotClass> FromVirtualArg<'s> for Gd<T> {
    unsafe fn from_virtual_arg(ptr: sys::GDExtensionConstTypePtr, scope: &'s Scope) -> Self {
        match Option::<Gd<T>>::from_virtual_arg(ptr, scope) {
            Some(gd) => gd,
            None => panic!("{}: expected {} argument, got null", scope.context, T::CLASS_NAME),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Return values

/// Type that can be written into the return slot of a virtual call.
pub trait VirtualReturn {
    /// Moves `self` into the engine's return slot.
    ///
    /// # Safety
    /// `ret` must point to an initialized value of the engine type corresponding to `Self`.
    unsafe fn write_virtual_return(self, ret: sys::GDExtensionTypePtr);
}

impl VirtualReturn for () {
    unsafe fn write_virtual_return(self, _ret: sys::GDExtensionTypePtr) {}
}

macro_rules! impl_virtual_return_copy {
    ($($T:ty => $Raw:ty),* $(,)?) => {
        $(
            impl VirtualReturn for $T {
                unsafe fn write_virtual_return(self, ret: sys::GDExtensionTypePtr) {
                    ptr::write(ret as *mut $Raw, self as $Raw);
                }
            }
        )*
    };
}

impl_virtual_return_copy! {
    i64 => i64,
    i32 => i64,
    f64 => f64,
    f32 => f64,
}

impl VirtualReturn for bool {
    unsafe fn write_virtual_return(self, ret: sys::GDExtensionTypePtr) {
        ptr::write(ret as *mut sys::GDExtensionBool, sys::conv::bool_to_sys(self));
    }
}

macro_rules! impl_virtual_return_ffi {
    ($($T:ident),* $(,)?) => {
        $(
            impl VirtualReturn for $T {
                unsafe fn write_virtual_return(self, ret: sys::GDExtensionTypePtr) {
                    self.move_return_ptr(ret, PtrcallType::Virtual);
                }
            }
        )*
    };
}

impl_virtual_return_ffi!(Vector2, Vector3, Color, GString, StringName, Variant, Array, Dictionary);

impl<T: GodotClass> VirtualReturn for Option<Gd<T>> {
    unsafe fn write_virtual_return(self, ret: sys::GDExtensionTypePtr) {
        let is_ref = <T::Memory as Memory>::IS_REF_COUNTED == Some(true);

        match (self, is_ref) {
            // The engine's Ref takes its own reference; ours is released when `gd` drops.
            (Some(gd), true) => interface_fn!(ref_set_object)(ret, gd.obj_sys()),
            (None, true) => interface_fn!(ref_set_object)(ret, ptr::null_mut()),
            (Some(gd), false) => {
                // Ownership of manual objects passes to the engine.
                let raw = gd.obj_sys();
                gd.forget_ownership();
                ptr::write(ret as *mut sys::GDExtensionObjectPtr, raw);
            }
            (None, false) => ptr::write(ret as *mut sys::GDExtensionObjectPtr, ptr::null_mut()),
        }
    }
}

impl<T: GodotClass> VirtualReturn for Gd<T> {
    unsafe fn write_virtual_return(self, ret: sys::GDExtensionTypePtr) {
        Some(self).write_virtual_return(ret);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Trampoline

/// Runs one virtual call of class `C` from the engine.
///
/// `call` decodes the arguments through [`VirtualArgs`], calls [`VirtualArgs::finish()`] and invokes the user method.
/// Panics are caught and reported with the call context; the return slot then keeps its default value.
///
/// # Safety
/// Must only be called by the engine through a function pointer handed out by the virtual lookup of `C` or a subclass:
/// `instance` is the extension instance, `args` and `ret` match the virtual method's signature.
pub unsafe fn virtual_trampoline<C, R, F>(
    instance: sys::GDExtensionClassInstancePtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    method_name: &'static str,
    arity: usize,
    call: F,
) where
    C: UserClass,
    R: VirtualReturn,
    F: for<'s> FnOnce(&mut C, &VirtualArgs<'s>) -> R,
{
    let context = || CallContext::func(C::CLASS_NAME, method_name);

    let _ = handle_panic(
        context,
        AssertUnwindSafe(|| {
            let storage = as_storage(instance);
            let scope = Scope::open(C::CLASS_NAME, method_name);
            let virtual_args = VirtualArgs::new(&scope, args, arity);

            let result = {
                // Binds the part of type C, which may be embedded in a derived class's instance.
                let mut guard = storage.get_mut::<C>();
                call(&mut *guard, &virtual_args)
            };
            scope.advance(ScopePhase::ImplInvoked);

            result.write_virtual_return(ret);
            scope.advance(ScopePhase::ResultEncoded);
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order() {
        let scope = Scope::open("Test", "method");
        assert_eq!(scope.phase(), ScopePhase::Opened);

        scope.advance(ScopePhase::ArgsDecoded);
        scope.advance(ScopePhase::ImplInvoked);
        scope.advance(ScopePhase::ResultEncoded);
        assert_eq!(scope.phase(), ScopePhase::ResultEncoded);
    }

    #[test]
    #[should_panic(expected = "Test::method: scope phase ImplInvoked cannot follow Opened")]
    fn skipping_a_phase_panics() {
        let scope = Scope::open("Test", "method");
        scope.advance(ScopePhase::ImplInvoked);
    }

    #[test]
    fn retained_values_live_until_close() {
        use std::rc::Rc;

        let tracker = Rc::new(());
        {
            let scope = Scope::open("Test", "method");
            let first = scope.retain(Rc::clone(&tracker));
            let _second = scope.retain(Rc::clone(&tracker));

            assert_eq!(Rc::strong_count(first), 3);
            assert_eq!(scope.retained_count(), 2);
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    #[should_panic(expected = "arguments can only be retained while decoding")]
    fn retain_after_decoding_panics() {
        let scope = Scope::open("Test", "method");
        scope.advance(ScopePhase::ArgsDecoded);
        scope.retain(5);
    }

    #[test]
    fn scalar_args_decode() {
        let scope = Scope::open("Test", "method");
        let int = 42i64;
        let float = 2.5f64;
        let flag: sys::GDExtensionBool = 1;
        let ptrs: [sys::GDExtensionConstTypePtr; 3] = [
            &int as *const i64 as _,
            &float as *const f64 as _,
            &flag as *const u8 as _,
        ];

        let args = unsafe { VirtualArgs::new(&scope, ptrs.as_ptr(), 3) };
        assert_eq!(args.arg::<i32>(0), 42);
        assert_eq!(args.arg::<f32>(1), 2.5);
        assert!(args.arg::<bool>(2));
        args.finish();
    }

    #[test]
    #[should_panic(expected = "argument index 1 out of range for 1 arguments")]
    fn arg_index_out_of_range_panics() {
        let scope = Scope::open("Test", "method");
        let int = 1i64;
        let ptrs: [sys::GDExtensionConstTypePtr; 1] = [&int as *const i64 as _];

        let args = unsafe { VirtualArgs::new(&scope, ptrs.as_ptr(), 1) };
        args.arg::<i64>(1);
    }

    #[test]
    fn scalar_returns_encode() {
        let mut int = 0i64;
        let mut flag: sys::GDExtensionBool = 0;

        unsafe {
            7i32.write_virtual_return(&mut int as *mut i64 as _);
            true.write_virtual_return(&mut flag as *mut u8 as _);
        }

        assert_eq!(int, 7);
        assert_eq!(flag, 1);
    }
}
