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
use crate::builtin::{ToGodot, Variant};
use crate::handle::{HandleKind, HandleState};

/// Engine dictionary with [`Variant`] keys and values.
///
/// Like [`Array`](crate::builtin::Array), cloning shares the underlying dictionary.
#[repr(C)]
pub struct Dictionary {
    opaque: sys::OpaqueDictionary,
    state: HandleState,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::new_default()
    }

    pub fn len(&self) -> usize {
        let mut size: i64 = 0;

        // SAFETY: builtin method without arguments, returning int.
        unsafe {
            sys::builtin_fn!(dictionary_size)(
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

    pub fn contains_key(&self, key: impl ToGodot) -> bool {
        let key = key.to_variant();
        let args = [key.sys()];
        let mut found = sys::conv::SYS_FALSE;

        // SAFETY: has() takes one variant argument and returns bool.
        unsafe {
            sys::builtin_fn!(dictionary_has)(
                sys::force_mut_ptr(self.sys()),
                args.as_ptr(),
                &mut found as *mut sys::GDExtensionBool as sys::GDExtensionTypePtr,
                1,
            );
        }

        sys::conv::bool_from_sys(found)
    }

    /// Copy of the value for `key`, or `None` if absent.
    pub fn get(&self, key: impl ToGodot) -> Option<Variant> {
        let key = key.to_variant();
        if !self.contains_key(&key) {
            return None;
        }

        // SAFETY: key exists, so the engine returns a pointer to a live value.
        unsafe {
            let value = interface_fn!(dictionary_operator_index_const)(self.sys(), key.sys());
            Some(Variant::new_with_uninit(|dest| interface_fn!(variant_new_copy)(dest, value)))
        }
    }

    /// Inserts or replaces the value for `key`.
    pub fn set(&mut self, key: impl ToGodot, value: impl ToGodot) {
        let key = key.to_variant();
        let value = value.to_variant();

        // SAFETY: operator[] inserts Nil for missing keys and returns the slot; the old value is destroyed before the
        // copy is constructed in place.
        unsafe {
            let slot = interface_fn!(dictionary_operator_index)(self.sys_mut(), key.sys());
            interface_fn!(variant_destroy)(slot);
            interface_fn!(variant_new_copy)(slot, value.sys());
        }
    }

    pub fn clear(&mut self) {
        // SAFETY: clear takes no arguments and returns nothing.
        unsafe { sys::builtin_fn!(dictionary_clear)(self.sys_mut(), ptr::null(), ptr::null_mut(), 0) };
    }
}

impl_builtin_handle! {
    Dictionary: OpaqueDictionary, HandleKind::Dictionary;
    default(dest) => sys::builtin_fn!(dictionary_construct_default)(dest, ptr::null()),
    copy(dest, src) => sys::builtin_fn!(dictionary_construct_copy)(dest, [src].as_ptr()),
    destroy(ptr) => sys::builtin_fn!(dictionary_destroy)(ptr),
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ToGodot, V: ToGodot> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dictionary(len={}, {})", self.len(), self.ownership())
    }
}
