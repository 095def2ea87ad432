/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! `get_proc_address` and the diagnostics functions.

use std::ffi::{c_char, CStr};

use gdbind::sys;

use super::{config, methods, objects, values, with_engine};

const VERSION_STRING: &CStr = c"Godot Engine v4.3.stable.mock";

unsafe extern "C" fn get_godot_version(version: *mut sys::GDExtensionGodotVersion) {
    *version = sys::GDExtensionGodotVersion {
        major: 4,
        minor: 3,
        patch: 0,
        string: VERSION_STRING.as_ptr(),
    };
}

unsafe fn lossy(text: *const c_char) -> String {
    if text.is_null() {
        return String::new();
    }
    CStr::from_ptr(text).to_string_lossy().into_owned()
}

unsafe extern "C" fn print_error(
    description: *const c_char,
    function: *const c_char,
    file: *const c_char,
    line: i32,
    _editor_notify: sys::GDExtensionBool,
) {
    let description = lossy(description);
    eprintln!("ERROR: {description}\n   at: {} ({}:{line})", lossy(function), lossy(file));
    with_engine(|e| e.errors.push(description));
}

unsafe extern "C" fn print_warning(
    description: *const c_char,
    function: *const c_char,
    file: *const c_char,
    line: i32,
    _editor_notify: sys::GDExtensionBool,
) {
    let description = lossy(description);
    eprintln!("WARNING: {description}\n     at: {} ({}:{line})", lossy(function), lossy(file));
    with_engine(|e| e.warnings.push(description));
}

/// Erases the signature of an interface function.
macro_rules! erase {
    ($function:expr) => {
        // SAFETY: the library transmutes the pointer back to the signature it declares for this name.
        Some(unsafe { std::mem::transmute::<*const (), unsafe extern "C" fn()>($function as *const ()) })
    };
}

fn lookup(name: &str) -> sys::GDExtensionInterfaceFunctionPtr {
    match name {
        "get_godot_version" => erase!(get_godot_version),
        "print_error" => erase!(print_error),
        "print_warning" => erase!(print_warning),

        "variant_new_copy" => erase!(values::variant_new_copy),
        "variant_new_nil" => erase!(values::variant_new_nil),
        "variant_destroy" => erase!(values::variant_destroy),
        "variant_get_type" => erase!(values::variant_get_type),
        "get_variant_from_type_constructor" => erase!(values::get_variant_from_type_constructor),
        "get_variant_to_type_constructor" => erase!(values::get_variant_to_type_constructor),
        "variant_get_ptr_constructor" => erase!(values::variant_get_ptr_constructor),
        "variant_get_ptr_destructor" => erase!(values::variant_get_ptr_destructor),
        "variant_get_ptr_builtin_method" => erase!(values::variant_get_ptr_builtin_method),

        "string_new_with_utf8_chars_and_len" => erase!(values::string_new_with_utf8_chars_and_len),
        "string_to_utf8_chars" => erase!(values::string_to_utf8_chars),
        "string_name_new_with_utf8_chars_and_len" => erase!(values::string_name_new_with_utf8_chars_and_len),
        "array_operator_index" => erase!(values::array_operator_index),
        "dictionary_operator_index" => erase!(values::dictionary_operator_index),
        "dictionary_operator_index_const" => erase!(values::dictionary_operator_index_const),

        "object_method_bind_ptrcall" => erase!(methods::object_method_bind_ptrcall),
        "object_destroy" => erase!(objects::object_destroy),
        "object_get_instance_id" => erase!(objects::object_get_instance_id),
        "object_get_instance_from_id" => erase!(objects::object_get_instance_from_id),
        "object_cast_to" => erase!(objects::object_cast_to),
        "object_get_class_name" => erase!(objects::object_get_class_name),
        "object_set_instance" => erase!(objects::object_set_instance),
        "object_get_instance_binding" => erase!(objects::object_get_instance_binding),
        "object_set_instance_binding" => erase!(objects::object_set_instance_binding),
        "ref_get_object" => erase!(objects::ref_get_object),
        "ref_set_object" => erase!(objects::ref_set_object),

        "classdb_construct_object" => erase!(objects::classdb_construct_object),
        "classdb_get_method_bind" => erase!(methods::classdb_get_method_bind),
        "classdb_get_class_tag" => erase!(objects::classdb_get_class_tag),
        "classdb_register_extension_class" => erase!(objects::classdb_register_extension_class),
        "classdb_register_extension_class_method" => erase!(objects::classdb_register_extension_class_method),
        "classdb_unregister_extension_class" => erase!(objects::classdb_unregister_extension_class),

        _ => None,
    }
}

pub(super) unsafe extern "C" fn get_proc_address(name: *const c_char) -> sys::GDExtensionInterfaceFunctionPtr {
    let name = lossy(name);

    if config().hidden_interface_fns.iter().any(|hidden| *hidden == name) {
        return None;
    }
    lookup(&name)
}

#[cfg(test)]
mod tests {
    use super::lookup;
    use gdbind::sys::GDExtensionInterface;

    #[test]
    fn every_interface_function_is_provided() {
        for name in GDExtensionInterface::FUNCTION_NAMES {
            assert!(lookup(name).is_some(), "mock engine lacks interface function {name}");
        }
    }
}
