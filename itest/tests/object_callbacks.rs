/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Per-instance callbacks of the class creation info: notifications, dynamic properties and reference tracking.

use gdbind::prelude::*;
use gdbind_itest::mock::Value;
use gdbind_itest::{assert_no_violations, boot, mock, serial};

const DEFAULT_VOLUME: i64 = 50;

#[derive(GodotClass)]
#[class(base = Node, init)]
struct Mixer {
    #[base]
    base: Base<Node>,
    #[init(val = DEFAULT_VOLUME)]
    volume: i64,
    notifications: Vec<i32>,
}

#[godot_api]
impl INode for Mixer {
    fn on_notification(&mut self, what: i32) {
        self.notifications.push(what);
    }

    fn get_property(&self, property: StringName) -> Option<Variant> {
        (property == "volume").then(|| self.volume.to_variant())
    }

    fn set_property(&mut self, property: StringName, value: Variant) -> bool {
        if property != "volume" {
            return false;
        }

        match value.try_to::<i64>() {
            Ok(volume) => {
                self.volume = volume.clamp(0, 100);
                true
            }
            Err(_) => false,
        }
    }

    fn get_property_list(&mut self) -> Vec<PropertyInfo> {
        vec![
            PropertyInfo::of::<i64>("volume").with_hint(PropertyInfo::HINT_RANGE, "0,100"),
            PropertyInfo::new("muted", VariantType::Bool).with_usage(PropertyInfo::USAGE_EDITOR),
        ]
    }

    fn property_get_revert(&self, property: StringName) -> Option<Variant> {
        (property == "volume").then(|| DEFAULT_VOLUME.to_variant())
    }
}

/// Overrides nothing; all callbacks come from `Mixer`.
#[derive(GodotClass)]
#[class(base = Mixer, init)]
struct StudioMixer {
    #[parent]
    mixer: Mixer,
    channels: i64,
}

#[derive(GodotClass)]
#[class(base = RefCounted, init)]
struct Ticket {
    #[base]
    base: Base<RefCounted>,
}

fn mixer_of(object: mock::ObjectHandle) -> Gd<Mixer> {
    Gd::<Mixer>::try_from_instance_id(object.instance_id()).expect("not a Mixer")
}

#[test]
fn properties_go_through_instance() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Mixer").expect("Mixer not instantiable");

    assert_eq!(mock::get_property(object, "volume"), Some(Value::Int(DEFAULT_VOLUME)));
    assert_eq!(mock::get_property(object, "balance"), None);

    assert!(mock::set_property(object, "volume", Value::Int(140)));
    assert_eq!(mock::get_property(object, "volume"), Some(Value::Int(100)));

    // Unknown names and mistyped values are left to the engine.
    assert!(!mock::set_property(object, "balance", Value::Int(1)));
    assert!(!mock::set_property(object, "volume", Value::String("loud".to_string())));
    assert_eq!(mixer_of(object).bind().volume, 100);

    mock::release(object);
    assert_no_violations();
}

#[test]
fn property_list_is_handed_out_and_freed() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Mixer").expect("Mixer not instantiable");

    let list = mock::property_list(object);
    assert_eq!(list.len(), 2);

    let volume = &list[0];
    assert_eq!(volume.name, "volume");
    assert_eq!(volume.variant_type, VariantType::Int.sys());
    assert_eq!(volume.hint, PropertyInfo::HINT_RANGE);
    assert_eq!(volume.hint_string, "0,100");
    assert_eq!(volume.usage, PropertyInfo::USAGE_DEFAULT);

    let muted = &list[1];
    assert_eq!(muted.name, "muted");
    assert_eq!(muted.variant_type, VariantType::Bool.sys());
    assert_eq!(muted.usage, PropertyInfo::USAGE_EDITOR);

    // A second list is independent of the first.
    assert_eq!(mock::property_list(object), list);

    mock::release(object);
    assert_no_violations();
}

#[test]
fn revert_value_comes_from_instance() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Mixer").expect("Mixer not instantiable");
    assert!(mock::set_property(object, "volume", Value::Int(10)));

    assert!(mock::property_can_revert(object, "volume"));
    assert!(!mock::property_can_revert(object, "muted"));

    assert_eq!(mock::property_get_revert(object, "volume"), Some(Value::Int(DEFAULT_VOLUME)));
    assert_eq!(mock::property_get_revert(object, "muted"), None);

    mock::release(object);
    assert_no_violations();
}

#[test]
fn notifications_reach_instance() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Mixer").expect("Mixer not instantiable");

    assert!(mock::notify(object, 13));
    assert!(mock::notify(object, 17));
    assert_eq!(mixer_of(object).bind().notifications, [13, 17]);

    mock::release(object);
    assert_no_violations();
}

#[test]
fn derived_class_inherits_callbacks() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("StudioMixer").expect("StudioMixer not instantiable");

    assert!(mock::set_property(object, "volume", Value::Int(30)));
    assert_eq!(mock::get_property(object, "volume"), Some(Value::Int(30)));
    assert_eq!(mock::property_list(object).len(), 2);
    assert!(mock::notify(object, 2));

    let studio = Gd::<StudioMixer>::try_from_instance_id(object.instance_id()).expect("not a StudioMixer");
    {
        let studio = studio.bind();
        assert_eq!(studio.mixer.volume, 30);
        assert_eq!(studio.mixer.notifications, [2]);
        assert_eq!(studio.channels, 0);
    }
    drop(studio);

    mock::release(object);
    assert_no_violations();
}

#[test]
fn classes_without_overrides_have_no_callbacks() {
    boot();
    let _guard = serial();

    let ticket = Ticket::new_gd();
    let object = mock::handle_of(ticket.instance_id()).expect("object unknown to the engine");

    assert!(!mock::notify(object, 13));
    assert_eq!(mock::get_property(object, "volume"), None);
    assert!(mock::property_list(object).is_empty());

    drop(ticket);
    assert_no_violations();
}

#[test]
fn engine_references_are_reported_to_instance() {
    boot();
    let _guard = serial();

    let ticket = Ticket::new_gd();
    let object = mock::handle_of(ticket.instance_id()).expect("object unknown to the engine");
    assert_eq!(Some(ticket.__engine_ref_count()), mock::reference_count(object));

    let copies: Vec<Gd<Ticket>> = (0..3).map(|_| ticket.clone()).collect();
    assert_eq!(Some(ticket.__engine_ref_count()), mock::reference_count(object));
    assert_eq!(mock::reference_count(object), Some(4));

    drop(copies);
    assert_eq!(Some(ticket.__engine_ref_count()), mock::reference_count(object));
    assert_eq!(ticket.__engine_ref_count(), 1);

    drop(ticket);
    assert!(!mock::is_live(object));
    assert_no_violations();
}
