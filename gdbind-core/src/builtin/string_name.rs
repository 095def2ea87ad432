/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::c_char;
use std::fmt;
use std::ptr;

use gdbind_ffi as sys;
use sys::interface_fn;

use crate::builtin::macros::impl_builtin_handle;
use crate::builtin::GString;
use crate::handle::{HandleKind, HandleState};

/// Unique, interned string: method names, class names, groups.
///
/// Comparison is cheap on the engine side; conversion to Rust goes through [`GString`].
#[repr(C)]
pub struct StringName {
    opaque: sys::OpaqueStringName,
    state: HandleState,
}

impl StringName {
    /// Converts to a Rust string, copying the contents.
    pub fn to_rust_string(&self) -> String {
        GString::from(self).to_rust_string()
    }
}

impl_builtin_handle! {
    StringName: OpaqueStringName, HandleKind::StringName;
    default(dest) => sys::builtin_fn!(string_name_construct_default)(dest, ptr::null()),
    copy(dest, src) => sys::builtin_fn!(string_name_construct_copy)(dest, [src].as_ptr()),
    destroy(ptr) => sys::builtin_fn!(string_name_destroy)(ptr),
}

impl Default for StringName {
    fn default() -> Self {
        Self::new_default()
    }
}

impl From<&str> for StringName {
    fn from(s: &str) -> Self {
        let bytes = s.as_bytes();

        // SAFETY: the engine initializes the destination from a valid UTF-8 buffer.
        unsafe {
            Self::new_with_uninit(|dest| {
                interface_fn!(string_name_new_with_utf8_chars_and_len)(
                    dest,
                    bytes.as_ptr() as *const c_char,
                    bytes.len() as sys::GDExtensionInt,
                )
            })
        }
    }
}

impl From<&GString> for StringName {
    fn from(s: &GString) -> Self {
        let args = [s.sys()];

        // SAFETY: StringName(String) constructor initializes the destination.
        unsafe { Self::new_with_uninit(|dest| sys::builtin_fn!(string_name_from_string)(dest, args.as_ptr())) }
    }
}

impl PartialEq for StringName {
    fn eq(&self, other: &Self) -> bool {
        self.to_rust_string() == other.to_rust_string()
    }
}

impl Eq for StringName {}

impl PartialEq<&str> for StringName {
    fn eq(&self, other: &&str) -> bool {
        self.to_rust_string() == *other
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rust_string())
    }
}

impl fmt::Debug for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringName({:?}, {})", self.to_rust_string(), self.ownership())
    }
}
