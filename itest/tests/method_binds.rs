/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbind::classes::{Node, RefCounted};
use gdbind::obj::{NewAlloc, NewGd};
use gdbind::sys::{method_table, BindError};
use gdbind_itest::echo::ECHO_METHODS;
use gdbind_itest::{assert_no_violations, boot, mock, serial};

#[test]
fn binds_are_requested_once_at_startup() {
    boot();

    let resolved = [
        ("Object", "get_class"),
        ("RefCounted", "init_ref"),
        ("RefCounted", "unreference"),
        ("Node", "set_name"),
        ("Node", "get_child"),
        ("Node2D", "set_position"),
        ("Echo", "sum16"),
    ];

    for (class_name, method_name) in resolved {
        assert_eq!(
            mock::method_bind_requests(class_name, method_name),
            1,
            "{class_name}::{method_name}"
        );
    }
}

#[test]
fn repeated_calls_reuse_the_bind() {
    boot();
    let _guard = serial();

    let calls_before = mock::ptrcall_count("Node", "set_name");

    let mut node = Node::new_alloc();
    for i in 0..5 {
        node.set_name(&format!("node_{i}"));
    }
    assert_eq!(node.get_name(), "node_4");
    node.free();

    assert_eq!(mock::ptrcall_count("Node", "set_name") - calls_before, 5);
    assert_eq!(mock::method_bind_requests("Node", "set_name"), 1);
    assert_no_violations();
}

#[test]
fn cached_resolution_does_not_ask_the_engine() {
    boot();

    let table_entry = ECHO_METHODS.get().get_value;
    let resolved_before = method_table::resolved_count();

    let bind = method_table::try_resolve("Echo", "get_value", table_entry.hash).expect("resolution failed");
    assert_eq!(bind, table_entry.bind);
    assert_eq!(method_table::resolved_count(), resolved_before);
    assert_eq!(mock::method_bind_requests("Echo", "get_value"), 1);
}

#[test]
fn same_hash_different_methods_get_distinct_binds() {
    boot();
    let _guard = serial();

    let init_ref = mock::ptrcall_count("RefCounted", "init_ref");
    let reference = mock::ptrcall_count("RefCounted", "reference");
    let unreference = mock::ptrcall_count("RefCounted", "unreference");

    let object = RefCounted::new_gd();
    let copy = object.clone();
    drop(copy);
    drop(object);

    assert_eq!(mock::ptrcall_count("RefCounted", "init_ref") - init_ref, 1);
    assert_eq!(mock::ptrcall_count("RefCounted", "reference") - reference, 1);
    assert_eq!(mock::ptrcall_count("RefCounted", "unreference") - unreference, 2);
    assert_no_violations();
}

#[test]
fn unknown_method_is_reported() {
    boot();

    let err = method_table::try_resolve("Node", "no_such_method", 12345).expect_err("resolved unknown method");
    assert_eq!(
        err,
        BindError::UnresolvedMethod {
            class_name: "Node",
            method_name: "no_such_method",
            hash: 12345,
        }
    );
    assert_eq!(
        err.to_string(),
        "failed to resolve method bind Node::no_such_method (hash 12345)"
    );
}

#[test]
fn hash_mismatch_is_rejected() {
    boot();

    let result = method_table::try_resolve("Node", "get_child_count", 1);
    assert!(matches!(
        result,
        Err(BindError::UnresolvedMethod {
            method_name: "get_child_count",
            hash: 1,
            ..
        })
    ));
}
