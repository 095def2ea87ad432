/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Virtual calls on a three-level user hierarchy `A -> B -> C`, where the nearest class implementing a method wins.

use std::ptr;

use gdbind::prelude::*;
use gdbind::registry::ClassDb;
use gdbind_itest::{assert_no_violations, boot, mock};

#[derive(GodotClass)]
#[class(base = Node, init)]
struct A {
    #[base]
    base: Base<Node>,
    calls: Vec<String>,
}

#[godot_api]
impl INode for A {
    fn ready(&mut self) {
        self.calls.push("A.ready".to_string());
    }

    fn process(&mut self, delta: f64) {
        self.calls.push(format!("A.process({delta})"));
    }

    fn to_string(&self) -> GString {
        GString::from(format!("A with {} calls", self.calls.len()).as_str())
    }
}

#[derive(GodotClass)]
#[class(base = A, init)]
struct B {
    #[parent]
    a: A,
    #[init(val = 10)]
    frames: i64,
}

#[godot_api]
impl INode for B {
    fn process(&mut self, delta: f64) {
        self.frames += 1;
        self.a.calls.push(format!("B.process({delta})"));
    }
}

#[derive(GodotClass)]
#[class(base = B, init)]
struct C {
    #[parent]
    b: B,
}

/// Recorded calls of the `A` part of `object`.
fn calls_of(object: mock::ObjectHandle) -> Vec<String> {
    let gd = Gd::<A>::try_from_instance_id(object.instance_id()).expect("not an A");
    let calls = gd.bind().calls.clone();
    calls
}

#[test]
fn nearest_ancestor_implementation_wins() {
    boot();

    let c = mock::instantiate("C").expect("C not instantiable");
    assert_eq!(mock::class_of(c).as_deref(), Some("C"));

    // C implements nothing: `_process` comes from B, `_ready` and `_to_string` from A.
    assert!(mock::call_process(c, 0.5));
    assert!(mock::call_ready(c));
    assert_eq!(calls_of(c), ["B.process(0.5)", "A.ready"]);
    assert_eq!(mock::call_to_string(c).as_deref(), Some("A with 2 calls"));

    let gd = Gd::<C>::try_from_instance_id(c.instance_id()).expect("not a C");
    assert_eq!(gd.bind().b.frames, 11);
    drop(gd);

    mock::release(c);
    assert_no_violations();
}

#[test]
fn own_implementation_wins() {
    boot();

    let a = mock::instantiate("A").expect("A not instantiable");
    let b = mock::instantiate("B").expect("B not instantiable");

    assert!(mock::call_process(a, 1.0));
    assert!(mock::call_process(b, 1.0));
    assert_eq!(calls_of(a), ["A.process(1)"]);
    assert_eq!(calls_of(b), ["B.process(1)"]);

    mock::release(a);
    mock::release(b);
    assert_no_violations();
}

#[test]
fn unimplemented_virtual_falls_back_to_engine() {
    boot();

    let c = mock::instantiate("C").expect("C not instantiable");

    assert!(!mock::call_virtual(c, "_physics_process", &[], ptr::null_mut()));
    assert!(!mock::call_virtual(c, "_enter_tree", &[], ptr::null_mut()));
    assert!(!mock::call_virtual(c, "_no_such_virtual", &[], ptr::null_mut()));
    assert!(calls_of(c).is_empty());

    mock::release(c);
    assert_no_violations();
}

#[test]
fn registry_knows_the_chain() {
    boot();

    let db = ClassDb::get();
    let chain: Vec<&str> = db.ancestors("C").map(|record| record.name).collect();
    assert_eq!(chain, ["C", "B", "A", "Node", "Object"]);

    assert!(db.is_subclass_of("C", "A"));
    assert!(!db.is_subclass_of("A", "C"));

    let registered = mock::registered_classes();
    for (class_name, parent) in [("A", "Node"), ("B", "A"), ("C", "B")] {
        assert!(
            registered.contains(&(class_name.to_string(), parent.to_string())),
            "{class_name} not registered with base {parent}: {registered:?}"
        );
    }
}

#[test]
fn rust_side_instance_views_the_chain() {
    boot();

    let c = C::new_alloc();
    assert_eq!(c.upcast_ref::<Node>().get_class(), "C");
    assert!(c.upcast_ref::<Node>().is_class("Node"));

    let as_a = c.clone().upcast::<Node>().cast::<A>();
    assert_eq!(as_a.bind().base().get_class(), "C");
    assert_eq!(as_a.bind().calls.len(), 0);
    drop(as_a);

    c.free();
    assert_no_violations();
}
