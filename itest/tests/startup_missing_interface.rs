/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! An engine lacking an interface function: the library refuses to load, and leaves no state behind.

use gdbind::init::InitLevel;
use gdbind::registry::ClassDb;
use gdbind::sys;
use gdbind_itest::mock::{self, MockConfig};
use gdbind_itest::try_boot;

#[test]
fn missing_interface_function_refuses_load() {
    mock::configure(MockConfig {
        hidden_interface_fns: vec!["object_cast_to"],
        ..MockConfig::default()
    });

    assert!(!try_boot());
    assert!(!sys::is_initialized());
    assert!(!ClassDb::is_initialized());

    // Nothing was stored, so a complete engine can load the library afterwards.
    mock::configure(MockConfig::default());
    assert!(try_boot());
    assert!(sys::is_initialized());
    assert!(ClassDb::is_initialized());

    mock::initialize_levels(InitLevel::Editor);
    assert!(mock::errors().is_empty(), "errors: {:?}", mock::errors());
}
