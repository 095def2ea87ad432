/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::ptr;

use gdbind_ffi as sys;
use sys::interface_fn;

use crate::builtin::macros::impl_builtin_handle;
use crate::builtin::{FromGodot, ToGodot, Variant};
use crate::handle::{HandleKind, HandleState};

/// Untyped engine array of [`Variant`] elements.
///
/// Arrays are reference-counted on the engine side: [`Clone`] creates a second handle to the _same_ array, as in the
/// engine's own copy constructor. Each handle is still owned and released on its own.
#[repr(C)]
pub struct Array {
    opaque: sys::OpaqueArray,
    state: HandleState,
}

impl Array {
    pub fn new() -> Self {
        Self::new_default()
    }

    pub fn len(&self) -> usize {
        let mut size: i64 = 0;

        // SAFETY: builtin method without arguments, returning int.
        unsafe {
            sys::builtin_fn!(array_size)(
                sys::force_mut_ptr(self.sys()),
                ptr::null(),
                &mut size as *mut i64 as sys::GDExtensionTypePtr,
                0,
            );
        }

        size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a copy of `value`.
    pub fn push(&mut self, value: &Variant) {
        let args = [value.sys()];

        // SAFETY: push_back takes one variant argument and returns nothing.
        unsafe { sys::builtin_fn!(array_push_back)(self.sys_mut(), args.as_ptr(), ptr::null_mut(), 1) };
    }

    /// Appends any value that converts to a variant.
    pub fn push_value(&mut self, value: impl ToGodot) {
        self.push(&value.to_variant());
    }

    /// Copy of the element at `index`, or `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<Variant> {
        if index >= self.len() {
            return None;
        }

        // SAFETY: index is in bounds, so the engine returns a pointer to a live element.
        unsafe {
            let element = interface_fn!(array_operator_index)(sys::force_mut_ptr(self.sys()), index as i64);
            Some(Variant::new_with_uninit(|dest| interface_fn!(variant_new_copy)(dest, element)))
        }
    }

    /// Element at `index` converted to `T`.
    ///
    /// # Panics
    /// If `index` is out of bounds or the element has a different type.
    pub fn at<T: FromGodot>(&self, index: usize) -> T {
        let len = self.len();
        match self.get(index) {
            Some(element) => element.to(),
            None => panic!("Array index {index} out of bounds: length is {len}"),
        }
    }

    pub fn clear(&mut self) {
        // SAFETY: clear takes no arguments and returns nothing.
        unsafe { sys::builtin_fn!(array_clear)(self.sys_mut(), ptr::null(), ptr::null_mut(), 0) };
    }

    /// Copies of all elements.
    pub fn iter_shared(&self) -> impl Iterator<Item = Variant> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

impl_builtin_handle! {
    Array: OpaqueArray, HandleKind::Array;
    default(dest) => sys::builtin_fn!(array_construct_default)(dest, ptr::null()),
    copy(dest, src) => sys::builtin_fn!(array_construct_copy)(dest, [src].as_ptr()),
    destroy(ptr) => sys::builtin_fn!(array_destroy)(ptr),
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ToGodot> FromIterator<T> for Array {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Array::new();
        for value in iter {
            array.push_value(value);
        }
        array
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter_shared()).finish()
    }
}
