/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Using the binding before the engine loaded the library panics with a clear message.
//!
//! No test in this binary loads the library.

use gdbind::builtin::GString;
use gdbind::classes::Node;
use gdbind::obj::NewAlloc;
use gdbind::registry::ClassDb;
use gdbind::sys;

#[test]
#[should_panic(expected = "gdbind binding queried before initialization")]
fn interface_before_load() {
    let _ = sys::get_interface();
}

#[test]
#[should_panic(expected = "class registry queried before initialization")]
fn registry_before_load() {
    let _ = ClassDb::get();
}

#[test]
#[should_panic(expected = "queried before initialization")]
fn payload_before_load() {
    let _ = GString::from("too early");
}

#[test]
#[should_panic(expected = "queried before initialization")]
fn object_before_load() {
    let _ = Node::new_alloc();
}

#[test]
fn state_queries_do_not_panic() {
    assert!(!sys::is_initialized());
    assert!(!ClassDb::is_initialized());
}
