/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Values passed to the engine's `Echo` methods come back unchanged.

use gdbind::builtin::{Array, Color, Dictionary, GString, StringName, Variant, VariantType, Vector2, Vector3};
use gdbind::classes::Node;
use gdbind::handle::Ownership;
use gdbind::obj::{Gd, NewAlloc, NewGd};
use gdbind_itest::echo::Echo;
use gdbind_itest::{assert_no_violations, boot, mock};
use proptest::prelude::*;

fn echo() -> Gd<Echo> {
    boot();
    Echo::new_gd()
}

proptest! {
    #[test]
    fn int_roundtrip(value in any::<i64>()) {
        prop_assert_eq!(echo().echo_int(value), value);
    }

    #[test]
    fn i32_travels_as_int(value in any::<i32>()) {
        prop_assert_eq!(echo().echo_i32(value), value);
    }

    #[test]
    fn float_roundtrip_is_bit_exact(bits in any::<u64>()) {
        let value = f64::from_bits(bits);
        prop_assert_eq!(echo().echo_float(value).to_bits(), bits);
    }

    #[test]
    fn f32_travels_as_double(value in -1.0e30_f32..1.0e30_f32) {
        prop_assert_eq!(echo().echo_f32(value), value);
    }

    #[test]
    fn vector_roundtrip(x in -1.0e6_f32..1.0e6, y in -1.0e6_f32..1.0e6, z in -1.0e6_f32..1.0e6) {
        let echo = echo();

        prop_assert_eq!(echo.echo_vector2(Vector2::new(x, y)), Vector2::new(x, y));
        prop_assert_eq!(echo.echo_vector3(Vector3::new(x, y, z)), Vector3::new(x, y, z));
    }

    #[test]
    fn color_roundtrip(r in 0.0_f32..=1.0, g in 0.0_f32..=1.0, b in 0.0_f32..=1.0, a in 0.0_f32..=1.0) {
        let color = Color::from_rgba(r, g, b, a);
        prop_assert_eq!(echo().echo_color(color), color);
    }

    #[test]
    fn string_roundtrip(text in any::<String>()) {
        let echo = echo();
        let string = GString::from(text.as_str());

        prop_assert_eq!(echo.echo_string(&string).to_rust_string(), text.clone());
        prop_assert_eq!(echo.echo_str(&text).to_rust_string(), text);
    }

    #[test]
    fn string_name_roundtrip(text in "[a-zA-Z_][a-zA-Z0-9_]{0,24}") {
        let name = StringName::from(text.as_str());
        prop_assert_eq!(echo().echo_string_name(&name).to_rust_string(), text);
    }

    #[test]
    fn int_array_roundtrip(values in prop::collection::vec(any::<i64>(), 0..20)) {
        let array: Array = values.iter().copied().collect();
        let echoed = echo().echo_array(&array);

        let back: Vec<i64> = (0..echoed.len()).map(|i| echoed.at::<i64>(i)).collect();
        prop_assert_eq!(back, values);
    }
}

#[test]
fn bool_roundtrip() {
    let echo = echo();

    assert!(echo.echo_bool(true));
    assert!(!echo.echo_bool(false));
}

#[test]
fn integer_edges() {
    let echo = echo();

    for value in [0, 1, -1, i64::MIN, i64::MAX] {
        assert_eq!(echo.echo_int(value), value);
    }
    assert_eq!(echo.echo_i32(i32::MIN), i32::MIN);
    assert_eq!(echo.echo_i32(i32::MAX), i32::MAX);
}

#[test]
fn float_edges() {
    let echo = echo();

    assert_eq!(echo.echo_float(f64::INFINITY), f64::INFINITY);
    assert_eq!(echo.echo_float(f64::NEG_INFINITY), f64::NEG_INFINITY);
    assert!(echo.echo_float(f64::NAN).is_nan());
    assert_eq!(echo.echo_float(-0.0).to_bits(), (-0.0_f64).to_bits());
    assert_eq!(echo.echo_f32(f32::MIN_POSITIVE), f32::MIN_POSITIVE);
}

#[test]
fn string_edges() {
    let echo = echo();

    assert_eq!(echo.echo_str(""), "");
    assert!(echo.echo_string(&GString::new()).is_empty());
    assert_eq!(echo.echo_str("zero\0inside"), "zero\0inside");
    assert_eq!(echo.echo_str("Grüße, 世界 🦀").len(), 11);
}

#[test]
fn variant_roundtrip() {
    let echo = echo();

    assert!(echo.echo_variant(&Variant::nil()).is_nil());
    assert_eq!(echo.echo_variant(&Variant::from(7_i64)).to::<i64>(), 7);
    assert!(echo.echo_variant(&Variant::from(true)).to::<bool>());
    assert_eq!(echo.echo_variant(&Variant::from("text")).to::<String>(), "text");

    let vector = echo.echo_variant(&Variant::from(Vector2::new(1.0, 2.0)));
    assert_eq!(vector.get_type(), VariantType::Vector2);
    assert_eq!(vector.to::<Vector2>(), Vector2::new(1.0, 2.0));

    let wrong = echo.echo_variant(&Variant::from(1.5_f64)).try_to::<i64>();
    assert!(wrong.is_err());
}

#[test]
fn mixed_array_roundtrip() {
    let echo = echo();

    let mut array = Array::new();
    array.push_value(1_i64);
    array.push_value("two");
    array.push_value(Vector3::new(3.0, 3.0, 3.0));
    array.push(&Variant::nil());

    let echoed = echo.echo_array(&array);
    assert_eq!(echoed.len(), 4);
    assert_eq!(echoed.at::<i64>(0), 1);
    assert_eq!(echoed.at::<String>(1), "two");
    assert_eq!(echoed.at::<Vector3>(2), Vector3::splat(3.0));
    assert!(echoed.get(3).is_some_and(|v| v.is_nil()));
    assert!(echoed.get(4).is_none());
}

#[test]
fn dictionary_roundtrip() {
    let echo = echo();

    let dictionary: Dictionary = [("a", 1_i64), ("b", 2)].into_iter().collect();
    let echoed = echo.echo_dictionary(&dictionary);

    assert_eq!(echoed.len(), 2);
    assert_eq!(echoed.get("a").map(|v| v.to::<i64>()), Some(1));
    assert_eq!(echoed.get("b").map(|v| v.to::<i64>()), Some(2));
    assert!(!echoed.contains_key("c"));
}

#[test]
fn object_comes_back_borrowed() {
    let echo = echo();
    let node = Node::new_alloc();

    let echoed = echo.echo_object(&node).expect("echo_object returned null");
    assert_eq!(echoed.ownership(), Ownership::Borrowed);
    assert_eq!(echoed.instance_id(), node.instance_id());
    assert_eq!(echoed.get_class(), "Node");

    drop(echoed);
    assert!(node.is_instance_valid());
    node.free();
    assert_no_violations();
}

#[test]
fn spawned_object_is_owned_by_caller() {
    let echo = echo();

    let spawned = echo.spawn_ref_counted().expect("spawn_ref_counted returned null");
    assert_eq!(spawned.ownership(), Ownership::Owned);
    assert_eq!(spawned.get_reference_count(), 1);

    let engine_side = mock::handle_of(spawned.instance_id()).expect("spawned object unknown to engine");
    drop(spawned);

    assert!(!mock::is_live(engine_side));
    assert_no_violations();
}

#[test]
fn sixteen_arguments_fill_the_frame() {
    let values: Vec<i64> = (1..=16).collect();
    assert_eq!(echo().sum16(&values), 136);
}

#[test]
#[should_panic(expected = "call frame overflow: declared arity 16, attempted to write argument #16")]
fn seventeenth_argument_overflows_the_frame() {
    let values = [1_i64; 17];
    echo().sum16(&values);
}

#[test]
#[should_panic(expected = "call frame declares 16 arguments, but 15 were written")]
fn missing_argument_is_rejected_before_dispatch() {
    let values = [1_i64; 15];
    echo().sum16(&values);
}
