/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Every acquired handle is released exactly once; the engine agrees with the handle audit.

use std::panic::{catch_unwind, AssertUnwindSafe};

use gdbind::builtin::{Array, Dictionary, FromGodot, GString, StringName, ToGodot, Variant, Vector2};
use gdbind::classes::{Node, RefCounted};
use gdbind::handle::{audit, HandleKind, Ownership};
use gdbind::meta::dispatch;
use gdbind::obj::{Gd, NewAlloc, NewGd};
use gdbind::sys::CallFrame;
use gdbind_itest::echo::{Echo, ECHO_METHODS};
use gdbind_itest::{assert_no_violations, boot, mock, serial};

/// Creates, copies and passes around payloads of every kind, dropping all of them.
fn payload_workout() {
    let echo = Echo::new_gd();

    let string = GString::from("payload");
    let string_copy = string.clone();
    let name = StringName::from("payload_name");
    let variant = Variant::from(&string);
    let variant_copy = variant.clone();

    let mut array = Array::new();
    array.push(&variant);
    array.push_value(Vector2::new(1.0, 2.0));
    let array_alias = array.clone();

    let mut dictionary = Dictionary::new();
    dictionary.set("key", &array);
    dictionary.set(&name, 5_i64);

    let _ = echo.echo_string(&string_copy);
    let _ = echo.echo_string_name(&name);
    let _ = echo.echo_variant(&variant_copy);
    let _ = echo.echo_array(&array_alias);
    let _ = echo.echo_dictionary(&dictionary);
    let _ = echo.echo_str("temporary");

    for element in array.iter_shared() {
        let _ = element.get_type();
    }
}

#[test]
fn audit_is_counting() {
    assert!(audit::is_enabled(), "integration tests need the trace feature");
}

#[test]
fn payloads_are_balanced() {
    boot();
    let _guard = serial();

    // Warm-up: lazily cached class tags and names are created on first use.
    payload_workout();

    let audit_before = audit::snapshot();
    let native_before = mock::native_counts();

    payload_workout();

    let delta = audit::snapshot().since(&audit_before);
    assert!(delta.acquired > 0);
    assert_eq!(delta.acquired, delta.released, "unbalanced handles: {delta:?}");
    assert_eq!(delta.live(), 0);
    assert_eq!(mock::native_counts(), native_before);
    assert_no_violations();
}

#[test]
fn refcount_follows_handles() {
    boot();
    let _guard = serial();

    let object = RefCounted::new_gd();
    assert_eq!(object.ownership(), Ownership::Owned);
    assert_eq!(object.get_reference_count(), 1);

    let copy = object.clone();
    assert_eq!(copy.ownership(), Ownership::Owned);
    assert_eq!(object.get_reference_count(), 2);

    drop(copy);
    assert_eq!(object.get_reference_count(), 1);

    let engine_side = mock::handle_of(object.instance_id()).expect("object unknown to engine");
    drop(object);
    assert!(!mock::is_live(engine_side));
    assert_no_violations();
}

#[test]
fn variant_holds_a_reference() {
    boot();
    let _guard = serial();

    let object = RefCounted::new_gd();
    let engine_side = mock::handle_of(object.instance_id()).expect("object unknown to engine");

    let variant = object.to_variant();
    assert_eq!(mock::reference_count(engine_side), Some(2));

    let back = Gd::<RefCounted>::from_variant(&variant);
    assert_eq!(back, object);
    assert_eq!(mock::reference_count(engine_side), Some(3));

    drop(object);
    drop(back);
    assert_eq!(mock::reference_count(engine_side), Some(1));
    assert!(mock::is_live(engine_side));

    drop(variant);
    assert!(!mock::is_live(engine_side));
    assert_no_violations();
}

#[test]
fn bound_child_cannot_be_freed() {
    boot();
    let _guard = serial();

    let mut parent = Node::new_alloc();
    let child = Node::new_alloc();
    parent.add_child(&child);

    let bound = parent.get_child(0).expect("child missing");
    assert_eq!(bound.ownership(), Ownership::BoundTo(parent.instance_id()));
    assert_eq!(bound, child);

    let err = catch_unwind(AssertUnwindSafe(|| bound.free())).expect_err("free() on bound handle must panic");
    let message = err.downcast_ref::<String>().cloned().unwrap_or_default();
    assert!(message.contains("only the owning handle may free the object"), "{message}");

    // The parent's handle is borrowed as seen from the child.
    let seen_parent = child.get_parent().expect("parent missing");
    assert_eq!(seen_parent.ownership(), Ownership::Borrowed);
    assert_eq!(seen_parent, parent);
    drop(seen_parent);

    parent.remove_child(&child);
    assert_eq!(parent.get_child_count(), 0);
    child.free();
    parent.free();
    assert_no_violations();
}

#[test]
fn borrowed_copy_sees_free() {
    boot();
    let _guard = serial();

    let node = Node::new_alloc();
    let alias = node.clone();
    assert_eq!(alias.ownership(), Ownership::Borrowed);
    assert!(alias.is_instance_valid());

    node.free();
    assert!(!alias.is_instance_valid());
    assert_no_violations();
}

#[test]
fn refcounted_cannot_be_freed() {
    boot();
    let _guard = serial();

    let object = RefCounted::new_gd();
    let engine_side = mock::handle_of(object.instance_id()).expect("object unknown to engine");

    let err = catch_unwind(AssertUnwindSafe(|| object.free())).expect_err("free() on RefCounted must panic");
    let message = err.downcast_ref::<String>().cloned().unwrap_or_default();
    assert!(message.contains("free() forbidden on reference-counted"), "{message}");

    // The handle was dropped while unwinding, releasing the last reference.
    assert!(!mock::is_live(engine_side));
    assert_no_violations();
}

#[test]
fn unread_return_value_is_released() {
    boot();
    let _guard = serial();

    let echo = Echo::new_gd();
    let objects_before = mock::native_counts().objects;
    let audit_before = audit::snapshot();

    {
        let method = &ECHO_METHODS.get().spawn_ref_counted;
        let mut frame = CallFrame::new(0);
        let _ret = frame.ret::<Option<Gd<RefCounted>>>();

        // SAFETY: live receiver; spawn_ref_counted takes no arguments and returns an object.
        unsafe { dispatch::ptrcall(method, echo.obj_sys(), &mut frame) };
    }

    assert_eq!(mock::native_counts().objects, objects_before);
    assert_eq!(audit::snapshot().since(&audit_before).live(), 0);
    assert_no_violations();
}

#[test]
fn dropped_manual_handle_leaks_until_engine_frees() {
    boot();
    let _guard = serial();

    let audit_before = audit::snapshot();

    let node = Node::new_alloc();
    let engine_side = mock::handle_of(node.instance_id()).expect("node unknown to engine");
    drop(node);

    // Dropping does not destroy a manually managed object, and the audit still counts the handle.
    assert!(mock::is_live(engine_side));
    let delta = audit::snapshot().since(&audit_before);
    assert_eq!(delta.live_by_kind.get(&HandleKind::Object).copied(), Some(1));

    mock::release(engine_side);
    assert!(!mock::is_live(engine_side));
    assert_no_violations();
}
