/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! An engine lacking a method the binding needs: the level fails with a message naming the method and engine version.
//!
//! Own test binary, since the failure leaves the process half-initialized.

use gdbind::init::InitLevel;
use gdbind::registry::ClassDb;
use gdbind_itest::mock::{self, MockConfig};
use gdbind_itest::{level_events, try_boot, LevelEvent};

#[test]
fn missing_method_bind_fails_its_level() {
    mock::configure(MockConfig {
        hidden_methods: vec![("Node", "set_name")],
        ..MockConfig::default()
    });

    // Method binds are resolved per level, so loading itself succeeds.
    assert!(try_boot());
    mock::initialize_levels(InitLevel::Scene);

    let errors = mock::errors().join("\n");
    assert!(
        errors.contains("failed to resolve method bind Node::set_name (hash 3304788590)"),
        "errors: {errors}"
    );
    assert!(errors.contains("engine version 4.3.0"), "errors: {errors}");
    assert!(errors.contains("failed to initialize GDExtension level `Scene`"), "errors: {errors}");

    // Core went through; Scene stopped before user code ran.
    assert_eq!(level_events(), [LevelEvent::Init(InitLevel::Core), LevelEvent::Init(InitLevel::Servers)]);
    assert_eq!(mock::method_bind_requests("Object", "get_class"), 1);
    assert!(ClassDb::is_initialized());
}
