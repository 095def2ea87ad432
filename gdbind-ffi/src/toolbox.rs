/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Functions and macros that are not very specific to gdbind, but come in handy.

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros

/// Verifies a condition at compile time.
#[macro_export]
macro_rules! static_assert {
    ($cond:expr) => {
        const _: () = assert!($cond);
    };
    ($cond:expr, $msg:literal) => {
        const _: () = assert!($cond, $msg);
    };
}

/// Trace output.
#[cfg(feature = "trace")]
#[macro_export]
macro_rules! out {
    ()                          => (eprintln!());
    ($fmt:literal)              => (eprintln!($fmt));
    ($fmt:literal, $($arg:tt)*) => (eprintln!($fmt, $($arg)*));
}

/// Trace output.
#[cfg(not(feature = "trace"))]
// Sink-writing keeps the format arguments "used" without emitting anything.
#[macro_export]
macro_rules! out {
    ()                          => ({});
    ($fmt:literal)              => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt); });
    ($fmt:literal, $($arg:tt)*) => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt, $($arg)*); };)
}

/// Calls a function of the loaded interface table.
///
/// ```ignore
/// let id = interface_fn!(object_get_instance_id)(obj_ptr);
/// ```
#[macro_export]
macro_rules! interface_fn {
    ($name:ident) => {
        ($crate::get_interface().$name)
    };
}

/// Calls a function of the builtin lifecycle table.
#[macro_export]
macro_rules! builtin_fn {
    ($name:ident) => {
        ($crate::builtin_lifecycle_api().$name)
    };
    (variant . $name:ident) => {
        ($crate::builtin_lifecycle_api().variant.$name)
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Utility functions

/// Explicitly cast away `const` from a pointer, similar to C++ `const_cast`.
///
/// The `as` conversion simultaneously doing 10 other things, potentially causing unintended transmutations.
pub fn force_mut_ptr<T>(ptr: *const T) -> *mut T {
    ptr as *mut T
}

/// If `ptr` is not null, returns `Some(mapper(ptr))`; otherwise `None`.
#[inline]
pub fn ptr_then<T, R, F>(ptr: *mut T, mapper: F) -> Option<R>
where
    F: FnOnce(*mut T) -> R,
{
    if ptr.is_null() {
        None
    } else {
        Some(mapper(ptr))
    }
}

/// Returns a C `const char*` for a null-terminated byte string.
#[inline]
pub fn c_str(s: &[u8]) -> *const std::ffi::c_char {
    // Ensure null-terminated
    debug_assert!(!s.is_empty() && s[s.len() - 1] == 0);

    s.as_ptr() as *const std::ffi::c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ptr_then_maps_non_null() {
        let mut value = 5;
        let ptr: *mut i32 = &mut value;

        assert_eq!(ptr_then(ptr, |p| unsafe { *p } * 2), Some(10));
        assert_eq!(ptr_then(std::ptr::null_mut::<i32>(), |p| unsafe { *p }), None);
    }

    #[test]
    fn c_str_points_to_bytes() {
        let bytes = b"object_destroy\0";
        assert_eq!(c_str(bytes) as *const u8, bytes.as_ptr());
    }
}
