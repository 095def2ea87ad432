/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;
use std::ptr;

use crate as sys;
use crate::lifecycle::PtrDestructorFn;

/// Caches `StringName` instances while tables are being resolved.
pub struct StringCache<'a> {
    // Box is needed for element stability (new insertions don't move object; i.e. pointers to it remain valid).
    instances_by_str: HashMap<&'static str, Box<sys::OpaqueStringName>>,
    interface: &'a sys::GDExtensionInterface,
    string_name_destroy: PtrDestructorFn,
}

impl<'a> StringCache<'a> {
    pub fn new(interface: &'a sys::GDExtensionInterface, string_name_destroy: PtrDestructorFn) -> Self {
        Self {
            instances_by_str: HashMap::new(),
            interface,
            string_name_destroy,
        }
    }

    /// Get a pointer to a `StringName`. Reuses cached instances, only deallocates on destruction of this cache.
    pub fn fetch(&mut self, key: &'static str) -> sys::GDExtensionStringNamePtr {
        assert!(key.is_ascii(), "string is not ASCII: {key}");

        if let Some(opaque_box) = self.instances_by_str.get_mut(key) {
            return box_to_sname_ptr(opaque_box);
        }

        let mut opaque_box = Box::new(sys::OpaqueStringName::zeroed());
        let sname_ptr = box_to_sname_ptr(&mut opaque_box);

        // SAFETY: destination is writable storage of the right size; the engine initializes it.
        unsafe {
            (self.interface.string_name_new_with_utf8_chars_and_len)(
                sname_ptr,
                key.as_ptr() as *const std::ffi::c_char,
                key.len() as sys::GDExtensionInt,
            );
        }

        self.instances_by_str.insert(key, opaque_box);
        sname_ptr
    }
}

/// Destroy all string names.
impl Drop for StringCache<'_> {
    fn drop(&mut self) {
        for (_, mut opaque_box) in self.instances_by_str.drain() {
            // SAFETY: every cached name was initialized by the engine in fetch().
            unsafe { (self.string_name_destroy)(box_to_sname_ptr(&mut opaque_box)) };
        }
    }
}

// Tiny wrapper to avoid exposed `as` casts (which are very easy to get wrong, i.e. extra dereference).
fn box_to_sname_ptr(boxed: &mut Box<sys::OpaqueStringName>) -> sys::GDExtensionStringNamePtr {
    let opaque_ptr = ptr::addr_of_mut!(**boxed);
    opaque_ptr as sys::GDExtensionStringNamePtr
}
