/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Methods exposed with `#[func]`, called by the engine through their varcall and ptrcall entry points.

use gdbind::prelude::*;
use gdbind::sys;
use gdbind_itest::mock::Value;
use gdbind_itest::{assert_no_violations, boot, mock, serial};

#[derive(GodotClass)]
#[class(base = Node, init)]
struct Counter {
    #[base]
    base: Base<Node>,
    total: i64,
}

#[godot_api]
impl Counter {
    #[func]
    fn add(&mut self, amount: i64) -> i64 {
        self.total += amount;
        self.total
    }

    #[func]
    fn total(&self) -> i64 {
        self.total
    }

    #[func]
    fn reset(&mut self) {
        self.total = 0;
    }

    #[func]
    fn describe(label: GString, count: i64) -> GString {
        GString::from(format!("{label}: {count}").as_str())
    }

    #[func]
    fn overflow(&self) -> i64 {
        panic!("counter overflowed at {}", self.total);
    }

    // Not exposed.
    fn double(&self) -> i64 {
        self.total * 2
    }
}

fn errors_since(before: usize) -> String {
    mock::errors()[before..].join("\n")
}

#[test]
fn funcs_are_registered_with_signature() {
    boot();
    let _guard = serial();

    let methods = mock::registered_methods("Counter");
    let names: Vec<&str> = methods.iter().map(|method| method.name.as_str()).collect();
    assert_eq!(names, ["add", "total", "reset", "describe", "overflow"]);

    let add = &methods[0];
    assert!(!add.is_static);
    assert_eq!(add.arguments.len(), 1);
    assert_eq!(add.arguments[0].name, "amount");
    assert_eq!(add.arguments[0].variant_type, VariantType::Int.sys());
    assert_eq!(
        add.return_value.as_ref().map(|ret| ret.variant_type),
        Some(VariantType::Int.sys())
    );

    let reset = &methods[2];
    assert!(reset.return_value.is_none());
    assert!(reset.arguments.is_empty());

    let describe = &methods[3];
    assert!(describe.is_static);
    let arg_types: Vec<_> = describe.arguments.iter().map(|arg| arg.variant_type).collect();
    assert_eq!(arg_types, [VariantType::String.sys(), VariantType::Int.sys()]);

    assert_no_violations();
}

#[test]
fn varcall_reaches_instance() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Counter").expect("Counter not instantiable");

    assert_eq!(mock::call_method(object, "add", &[Value::Int(5)]), Ok(Value::Int(5)));
    assert_eq!(mock::call_method(object, "add", &[Value::Int(-2)]), Ok(Value::Int(3)));
    assert_eq!(mock::call_method(object, "total", &[]), Ok(Value::Int(3)));

    // Methods without return value yield nil.
    assert_eq!(mock::call_method(object, "reset", &[]), Ok(Value::Nil));
    assert_eq!(mock::call_method(object, "total", &[]), Ok(Value::Int(0)));

    let counter = Gd::<Counter>::try_from_instance_id(object.instance_id()).expect("not a Counter");
    assert_eq!(counter.bind().double(), 0);
    drop(counter);

    mock::release(object);
    assert_no_violations();
}

#[test]
fn static_func_needs_no_instance() {
    boot();
    let _guard = serial();

    let described = mock::call_static_method(
        "Counter",
        "describe",
        &[Value::String("apples".to_string()), Value::Int(7)],
    );
    assert_eq!(described, Ok(Value::String("apples: 7".to_string())));

    let err = mock::call_static_method("Counter", "total", &[]).unwrap_err();
    assert_eq!(err.error, sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL);

    assert_no_violations();
}

#[test]
fn varcall_reports_arity_mismatch() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Counter").expect("Counter not instantiable");

    let err = mock::call_method(object, "add", &[]).unwrap_err();
    assert_eq!(err.error, sys::GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS);
    assert_eq!(err.expected, 1);

    let err = mock::call_method(object, "add", &[Value::Int(1), Value::Int(2)]).unwrap_err();
    assert_eq!(err.error, sys::GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS);
    assert_eq!(err.expected, 1);

    // Nothing was called.
    assert_eq!(mock::call_method(object, "total", &[]), Ok(Value::Int(0)));

    mock::release(object);
    assert_no_violations();
}

#[test]
fn varcall_names_mistyped_argument() {
    boot();
    let _guard = serial();

    let err = mock::call_static_method(
        "Counter",
        "describe",
        &[Value::String("pears".to_string()), Value::String("many".to_string())],
    )
    .unwrap_err();

    assert_eq!(err.error, sys::GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT);
    assert_eq!(err.argument, 1);
    assert_eq!(err.expected, VariantType::Int.sys());

    assert_no_violations();
}

#[test]
fn panic_in_func_fails_call() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Counter").expect("Counter not instantiable");
    mock::call_method(object, "add", &[Value::Int(9)]).expect("add failed");

    let before = mock::errors().len();
    let err = mock::call_method(object, "overflow", &[]).unwrap_err();
    assert_eq!(err.error, sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD);

    let errors = errors_since(before);
    assert!(errors.contains("Context: Counter::overflow"), "{errors}");
    assert!(errors.contains("counter overflowed at 9"), "{errors}");

    // The instance is not left bound.
    assert_eq!(mock::call_method(object, "total", &[]), Ok(Value::Int(9)));

    mock::release(object);
    assert_no_violations();
}

#[test]
fn ptrcall_passes_native_values() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Counter").expect("Counter not instantiable");

    let amount = 40_i64;
    let mut ret = 0_i64;
    let args = [&amount as *const i64 as sys::GDExtensionConstTypePtr];
    assert!(mock::ptrcall_method(
        object,
        "add",
        &args,
        &mut ret as *mut i64 as sys::GDExtensionTypePtr
    ));
    assert_eq!(ret, 40);

    let mut total = 0_i64;
    assert!(mock::ptrcall_method(
        object,
        "total",
        &[],
        &mut total as *mut i64 as sys::GDExtensionTypePtr
    ));
    assert_eq!(total, 40);

    assert!(!mock::ptrcall_method(object, "double", &[], std::ptr::null_mut()));

    mock::release(object);
    assert_no_violations();
}

#[test]
fn unexposed_method_is_unknown() {
    boot();
    let _guard = serial();

    let object = mock::instantiate("Counter").expect("Counter not instantiable");

    let err = mock::call_method(object, "double", &[]).unwrap_err();
    assert_eq!(err.error, sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD);

    mock::release(object);
    assert_no_violations();
}
