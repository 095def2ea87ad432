/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate as sys;

/// Calling convention of a pointer call; decides how results are written into the caller's slot.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PtrcallType {
    /// Outbound call through `object_method_bind_ptrcall`.
    Standard,

    /// Inbound call of a virtual method; reference-counted objects are passed as `Ref<T>` pointers.
    Virtual,
}

/// Types whose memory layout is exactly the engine's pointer-call representation.
///
/// See [`ffi_methods!`](crate::ffi_methods) for the implementation of plain-old-data types.
///
/// # Safety
/// [`new_from_sys`](GodotFfi::new_from_sys) and [`move_return_ptr`](GodotFfi::move_return_ptr) must properly
/// initialize and clean up values given the [`PtrcallType`] provided by the caller.
#[doc(hidden)] // shows up in implementors otherwise
pub unsafe trait GodotFfi {
    /// Reads a value from a type pointer without taking ownership of anything behind it.
    ///
    /// # Safety
    /// `ptr` must point to a valid, initialized value in the engine's representation of `Self`.
    unsafe fn new_from_sys(ptr: sys::GDExtensionConstTypePtr) -> Self;

    /// Pointer to the value, in the engine's representation.
    fn sys(&self) -> sys::GDExtensionConstTypePtr;

    /// Moves `self` into an engine-provided return slot.
    ///
    /// # Safety
    /// `dst` must point to storage the engine prepared for a value of this type.
    unsafe fn move_return_ptr(self, dst: sys::GDExtensionTypePtr, call_type: PtrcallType);
}

/// Implements [`GodotFfi`] methods for types that are passed by their own address.
///
/// ```ignore
/// unsafe impl GodotFfi for Vector2 {
///     ffi_methods! { type GDExtensionTypePtr = *mut Self; }
/// }
/// ```
#[macro_export]
macro_rules! ffi_methods {
    (type GDExtensionTypePtr = *mut Self;) => {
        unsafe fn new_from_sys(ptr: $crate::GDExtensionConstTypePtr) -> Self {
            ::std::ptr::read(ptr as *const Self)
        }

        fn sys(&self) -> $crate::GDExtensionConstTypePtr {
            self as *const Self as $crate::GDExtensionConstTypePtr
        }

        unsafe fn move_return_ptr(self, dst: $crate::GDExtensionTypePtr, _call_type: $crate::PtrcallType) {
            ::std::ptr::write(dst as *mut Self, self);
        }
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scalar implementations

// SAFETY: ptrcall representation of int, float and bool matches the Rust type exactly.
unsafe impl GodotFfi for i64 {
    ffi_methods! { type GDExtensionTypePtr = *mut Self; }
}

unsafe impl GodotFfi for f64 {
    ffi_methods! { type GDExtensionTypePtr = *mut Self; }
}

unsafe impl GodotFfi for bool {
    ffi_methods! { type GDExtensionTypePtr = *mut Self; }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip_through_pointer() {
        let mut slot = 0i64;
        unsafe { 42i64.move_return_ptr(&mut slot as *mut i64 as _, PtrcallType::Standard) };
        assert_eq!(slot, 42);

        let read = unsafe { i64::new_from_sys(slot.sys()) };
        assert_eq!(read, 42);
    }

    #[test]
    fn bool_uses_single_byte() {
        let value = true;
        let byte = unsafe { *(value.sys() as *const u8) };
        assert_eq!(byte, 1);
    }
}
