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
use crate::builtin::StringName;
use crate::handle::{HandleKind, HandleState};

/// Engine's reference-counted string type.
///
/// Each `GString` owns or borrows one native string (see [`ownership()`](Self::ownership)). Cloning creates a native
/// copy that is always owned.
#[repr(C)]
pub struct GString {
    opaque: sys::OpaqueString,
    state: HandleState,
}

impl GString {
    /// Empty string.
    pub fn new() -> Self {
        Self::new_default()
    }

    /// Number of characters (Unicode code points).
    pub fn len(&self) -> usize {
        let mut length: i64 = 0;

        // SAFETY: builtin method of String without arguments, returning int.
        unsafe {
            sys::builtin_fn!(string_length)(
                sys::force_mut_ptr(self.sys()),
                ptr::null(),
                &mut length as *mut i64 as sys::GDExtensionTypePtr,
                0,
            );
        }

        length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts to a Rust string, copying the contents.
    pub fn to_rust_string(&self) -> String {
        // SAFETY: first call with null buffer returns the required length; second call fills exactly that many bytes.
        unsafe {
            let len = interface_fn!(string_to_utf8_chars)(self.sys(), ptr::null_mut(), 0);
            let mut buf = vec![0u8; len as usize];
            interface_fn!(string_to_utf8_chars)(self.sys(), buf.as_mut_ptr() as *mut c_char, len);

            String::from_utf8(buf).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

impl_builtin_handle! {
    GString: OpaqueString, HandleKind::String;
    default(dest) => sys::builtin_fn!(string_construct_default)(dest, ptr::null()),
    copy(dest, src) => sys::builtin_fn!(string_construct_copy)(dest, [src].as_ptr()),
    destroy(ptr) => sys::builtin_fn!(string_destroy)(ptr),
}

impl Default for GString {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for GString {
    fn from(s: &str) -> Self {
        let bytes = s.as_bytes();

        // SAFETY: the engine initializes the destination from a valid UTF-8 buffer.
        unsafe {
            Self::new_with_uninit(|dest| {
                interface_fn!(string_new_with_utf8_chars_and_len)(
                    dest,
                    bytes.as_ptr() as *const c_char,
                    bytes.len() as sys::GDExtensionInt,
                )
            })
        }
    }
}

impl From<&String> for GString {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&StringName> for GString {
    fn from(name: &StringName) -> Self {
        let args = [name.sys()];

        // SAFETY: String(StringName) constructor initializes the destination.
        unsafe { Self::new_with_uninit(|dest| sys::builtin_fn!(string_from_string_name)(dest, args.as_ptr())) }
    }
}

impl From<&GString> for String {
    fn from(s: &GString) -> Self {
        s.to_rust_string()
    }
}

impl PartialEq for GString {
    fn eq(&self, other: &Self) -> bool {
        self.to_rust_string() == other.to_rust_string()
    }
}

impl Eq for GString {}

impl PartialEq<&str> for GString {
    fn eq(&self, other: &&str) -> bool {
        self.to_rust_string() == *other
    }
}

impl fmt::Display for GString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rust_string())
    }
}

impl fmt::Debug for GString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GString({:?}, {})", self.to_rust_string(), self.ownership())
    }
}
