/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Panics in user code stop at the C boundary and are reported to the engine.

use gdbind::prelude::*;
use gdbind_itest::{assert_no_violations, boot, mock, serial};

#[derive(GodotClass)]
#[class(base = Node, init)]
struct Fragile {
    #[base]
    base: Base<Node>,
    processed: i64,
}

#[godot_api]
impl INode for Fragile {
    fn ready(&mut self) {
        panic!("fragile ready failed");
    }

    fn process(&mut self, _delta: f64) {
        self.processed += 1;

        // Bound again while the engine callback holds the instance.
        let this = self.to_gd();
        let _ = this.bind().processed;
    }

    fn to_string(&self) -> GString {
        GString::from("still alive")
    }
}

#[derive(GodotClass)]
#[class(base = Node, init)]
struct Patient {
    #[base]
    base: Base<Node>,
    processed: i64,
    echoed: Option<String>,
}

#[godot_api]
impl INode for Patient {
    fn process(&mut self, _delta: f64) {
        self.processed += 1;

        let handle = mock::handle_of(self.base().instance_id()).expect("object unknown to the engine");
        let echoed = {
            let _base = self.base_mut();
            mock::call_to_string(handle)
        };
        self.echoed = echoed;
    }

    fn to_string(&self) -> GString {
        GString::from(format!("processed {}", self.processed).as_str())
    }
}

/// Errors the engine received since `before`.
fn errors_since(before: usize) -> String {
    mock::errors()[before..].join("\n")
}

#[test]
fn panic_in_virtual_is_reported() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Fragile").expect("Fragile not instantiable");
    let before = mock::errors().len();

    assert!(mock::call_ready(object));

    let errors = errors_since(before);
    assert!(errors.contains("Context: Fragile::ready"), "{errors}");
    assert!(errors.contains("fragile ready failed"), "{errors}");

    // The instance survives the panic.
    assert_eq!(mock::call_to_string(object).as_deref(), Some("still alive"));

    mock::release(object);
    assert_no_violations();
}

#[test]
fn reentrant_bind_is_caught() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Fragile").expect("Fragile not instantiable");
    let before = mock::errors().len();

    assert!(mock::call_process(object, 0.25));

    let errors = errors_since(before);
    assert!(errors.contains("Gd::bind() failed, already bound; class = Fragile"), "{errors}");

    // Changes made before the panic are kept.
    let fragile = Gd::<Fragile>::try_from_instance_id(object.instance_id()).expect("not a Fragile");
    assert_eq!(fragile.bind().processed, 1);
    drop(fragile);

    mock::release(object);
    assert_no_violations();
}

#[test]
fn base_mut_lets_engine_call_back_in() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Patient").expect("Patient not instantiable");
    let before = mock::errors().len();

    assert!(mock::call_process(object, 0.25));
    assert_eq!(errors_since(before), "");

    let patient = Gd::<Patient>::try_from_instance_id(object.instance_id()).expect("not a Patient");
    {
        let patient = patient.bind();
        assert_eq!(patient.processed, 1);
        assert_eq!(patient.echoed.as_deref(), Some("processed 1"));
    }
    drop(patient);

    mock::release(object);
    assert_no_violations();
}
