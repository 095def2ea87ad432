/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Core of gdbind: handles, builtins, the ptrcall dispatcher and the class registry.
//!
//! Most users depend on the `gdbind` crate instead, which re-exports this crate together with the proc-macros.

mod storage;

pub mod builtin;
pub mod classes;
pub mod handle;
pub mod init;
pub mod log;
pub mod meta;
pub mod obj;
pub mod registry;

#[doc(hidden)]
pub mod private;

pub use gdbind_ffi as sys;
#[doc(hidden)]
pub use gdbind_ffi::out;
