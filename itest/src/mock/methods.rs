/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Method binds and their implementation behind `object_method_bind_ptrcall`.

use std::ffi::c_void;
use std::ptr;

use gdbind::sys;

use super::objects::{construct_by_name, duplicate_object, MockObject};
use super::values::{string_arg, string_name_arg, Value};
use super::{config, read_id, with_engine, Engine};

/// Method exposed by the engine; a method bind points to one of these.
pub(super) struct MethodSpec {
    class: &'static str,
    name: &'static str,
    hash: i64,
}

macro_rules! method_specs {
    ($( $class:literal . $name:ident = $hash:literal; )*) => {
        static METHODS: &[MethodSpec] = &[
            $( MethodSpec { class: $class, name: stringify!($name), hash: $hash }, )*
        ];
    };
}

method_specs! {
    "Object".get_class = 201670096;
    "Object".is_class = 3927539163;
    "Object".get_instance_id = 3905245786;
    "Object".set_meta = 3776071444;
    "Object".get_meta = 3990617847;
    "Object".has_meta = 2619796661;

    "RefCounted".init_ref = 2240911060;
    "RefCounted".reference = 2240911060;
    "RefCounted".unreference = 2240911060;
    "RefCounted".get_reference_count = 3905245786;

    "Node".set_name = 3304788590;
    "Node".get_name = 2002593661;
    "Node".set_process_priority = 1286410249;
    "Node".get_process_priority = 3905245786;
    "Node".add_child = 3863233950;
    "Node".get_child_count = 894402480;
    "Node".get_child = 541253412;
    "Node".get_parent = 3160264692;
    "Node".remove_child = 1078189570;
    "Node".duplicate = 3511555459;
    "Node".add_to_group = 3683006648;
    "Node".is_in_group = 2619796661;
    "Node".get_groups = 3995934104;

    "CanvasItem".set_modulate = 2920490490;
    "CanvasItem".get_modulate = 3444240500;
    "CanvasItem".set_visible = 2586408642;
    "CanvasItem".is_visible = 36873697;

    "Node2D".set_position = 743155724;
    "Node2D".get_position = 3341600327;
    "Node2D".set_rotation = 373806689;
    "Node2D".get_rotation = 1740695150;

    "Node3D".set_position = 3460891852;
    "Node3D".get_position = 3360562783;

    "Echo".echo_bool = 1000001;
    "Echo".echo_int = 1000002;
    "Echo".echo_float = 1000003;
    "Echo".echo_vector2 = 1000004;
    "Echo".echo_vector3 = 1000005;
    "Echo".echo_color = 1000006;
    "Echo".echo_string = 1000007;
    "Echo".echo_string_name = 1000008;
    "Echo".echo_variant = 1000009;
    "Echo".echo_array = 1000010;
    "Echo".echo_dictionary = 1000011;
    "Echo".echo_object = 1000012;
    "Echo".spawn_ref_counted = 1000013;
    "Echo".sum16 = 1000014;
    "Echo".set_value = 1000015;
    "Echo".get_value = 1000016;
}

pub(super) unsafe extern "C" fn classdb_get_method_bind(
    class_name: sys::GDExtensionConstStringNamePtr,
    method_name: sys::GDExtensionConstStringNamePtr,
    hash: sys::GDExtensionInt,
) -> sys::GDExtensionMethodBindPtr {
    let class_name = string_name_arg(class_name);
    let method_name = string_name_arg(method_name);

    with_engine(|e| {
        *e.method_bind_requests
            .entry((class_name.clone(), method_name.clone()))
            .or_default() += 1;
    });

    let hidden = config()
        .hidden_methods
        .iter()
        .any(|(class, method)| *class == class_name && *method == method_name);
    if hidden {
        return ptr::null();
    }

    METHODS
        .iter()
        .find(|spec| spec.class == class_name && spec.name == method_name && spec.hash == hash)
        .map_or(ptr::null(), |spec| spec as *const MethodSpec as sys::GDExtensionMethodBindPtr)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Calls

/// Arguments and return slot of one ptrcall.
struct Call {
    object: usize,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
}

impl Call {
    unsafe fn arg<T: Copy>(&self, index: usize) -> T {
        ptr::read(*self.args.add(index) as *const T)
    }

    unsafe fn arg_ptr(&self, index: usize) -> sys::GDExtensionConstTypePtr {
        *self.args.add(index)
    }

    unsafe fn ret<T>(&self, value: T) {
        ptr::write(self.ret as *mut T, value)
    }

    unsafe fn ret_bool(&self, value: bool) {
        self.ret(value as u8)
    }

    unsafe fn ret_object(&self, object: usize) {
        self.ret(object as *mut c_void)
    }
}

pub(super) unsafe extern "C" fn object_method_bind_ptrcall(
    method_bind: sys::GDExtensionMethodBindPtr,
    object: sys::GDExtensionObjectPtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
) {
    let Some(spec) = METHODS
        .iter()
        .find(|spec| ptr::eq(*spec, method_bind as *const MethodSpec))
    else {
        with_engine(|e| e.violation(format!("ptrcall with unknown method bind {method_bind:p}")));
        return;
    };

    let call = Call {
        object: object as usize,
        args,
        ret,
    };

    let receiver_ok = with_engine(|e| {
        *e.ptrcalls.entry((spec.class, spec.name)).or_default() += 1;

        if !e.is_instance_of(call.object, spec.class) {
            e.violation(format!(
                "ptrcall {}::{} on object {:#x}, which is not a live {}",
                spec.class, spec.name, call.object, spec.class
            ));
            return false;
        }
        true
    });

    if receiver_ok {
        dispatch(spec, &call);
    }
}

unsafe fn dispatch(spec: &MethodSpec, call: &Call) {
    let object = call.object;

    match (spec.class, spec.name) {
        // Object
        ("Object", "get_class") => with_engine(|e| {
            let class_name = object_field(e, object, |obj| obj.class_name().to_string());
            e.assign_string(call.ret, class_name.unwrap_or_default());
        }),
        ("Object", "is_class") => {
            let class_name = string_arg(call.arg_ptr(0));
            let result = with_engine(|e| e.is_instance_of(object, &class_name));
            call.ret_bool(result);
        }
        ("Object", "get_instance_id") => {
            let id = with_engine(|e| object_field(e, object, |obj| obj.id).unwrap_or(0));
            call.ret(id as i64);
        }
        ("Object", "set_meta") => {
            let name = string_name_arg(call.arg_ptr(0));
            let value = read_id(call.arg_ptr(1));
            with_engine(|e| {
                let copy = e.copy_variant(value);
                let previous = e.objects.get_mut(&object).and_then(|obj| {
                    let previous = obj.meta.iter().position(|(key, _)| *key == name).map(|i| obj.meta.remove(i).1);
                    obj.meta.push((name, copy));
                    previous
                });
                if let Some(previous) = previous {
                    e.destroy_variant(previous);
                }
            });
        }
        ("Object", "get_meta") => {
            let name = string_name_arg(call.arg_ptr(0));
            let default = read_id(call.arg_ptr(1));
            with_engine(|e| {
                let stored = object_field(e, object, |obj| {
                    obj.meta.iter().find(|(key, _)| *key == name).map(|(_, value)| *value)
                })
                .flatten();

                let value = e.variant_value(stored.unwrap_or(default));
                e.retain(&value);
                e.assign_variant(call.ret, value);
            });
        }
        ("Object", "has_meta") => {
            let name = string_name_arg(call.arg_ptr(0));
            let found = with_engine(|e| object_field(e, object, |obj| obj.meta.iter().any(|(key, _)| *key == name)));
            call.ret_bool(found.unwrap_or(false));
        }

        // RefCounted
        ("RefCounted", "init_ref") => call.ret_bool(with_engine(|e| e.init_ref(object))),
        ("RefCounted", "reference") => call.ret_bool(with_engine(|e| e.reference(object))),
        ("RefCounted", "unreference") => call.ret_bool(with_engine(|e| e.unreference(object))),
        ("RefCounted", "get_reference_count") => {
            let count = with_engine(|e| object_field(e, object, |obj| obj.refcount.map_or(0, |rc| rc.count)));
            call.ret(count.unwrap_or(0) as i64);
        }

        // Node
        ("Node", "set_name") => {
            let name = string_name_arg(call.arg_ptr(0));
            with_engine(|e| update(e, object, |obj| obj.name = name));
        }
        ("Node", "get_name") => with_engine(|e| {
            let name = object_field(e, object, |obj| obj.name.clone()).unwrap_or_default();
            e.assign_string_name(call.ret, name);
        }),
        ("Node", "set_process_priority") => {
            let priority = call.arg::<i64>(0);
            with_engine(|e| update(e, object, |obj| obj.process_priority = priority));
        }
        ("Node", "get_process_priority") => {
            let priority = with_engine(|e| object_field(e, object, |obj| obj.process_priority));
            call.ret(priority.unwrap_or(0));
        }
        ("Node", "add_child") => {
            let child = call.arg::<usize>(0);
            with_engine(|e| e.attach_child(object, child));
        }
        ("Node", "get_child_count") => {
            let count = with_engine(|e| object_field(e, object, |obj| obj.children.len()));
            call.ret(count.unwrap_or(0) as i64);
        }
        ("Node", "get_child") => {
            let index = call.arg::<i64>(0);
            let child = with_engine(|e| {
                object_field(e, object, |obj| {
                    let len = obj.children.len() as i64;
                    let index = if index < 0 { index + len } else { index };
                    usize::try_from(index).ok().and_then(|i| obj.children.get(i).copied())
                })
                .flatten()
            });
            call.ret_object(child.unwrap_or(0));
        }
        ("Node", "get_parent") => {
            let parent = with_engine(|e| object_field(e, object, |obj| obj.parent).flatten());
            call.ret_object(parent.unwrap_or(0));
        }
        ("Node", "remove_child") => {
            let child = call.arg::<usize>(0);
            with_engine(|e| e.detach_child(object, child));
        }
        ("Node", "duplicate") => {
            let copy = duplicate_object(object);
            call.ret_object(copy);
        }
        ("Node", "add_to_group") => {
            let group = string_name_arg(call.arg_ptr(0));
            with_engine(|e| {
                update(e, object, |obj| {
                    if !obj.groups.contains(&group) {
                        obj.groups.push(group);
                    }
                })
            });
        }
        ("Node", "is_in_group") => {
            let group = string_name_arg(call.arg_ptr(0));
            let found = with_engine(|e| object_field(e, object, |obj| obj.groups.contains(&group)));
            call.ret_bool(found.unwrap_or(false));
        }
        ("Node", "get_groups") => with_engine(|e| {
            let groups = object_field(e, object, |obj| obj.groups.clone()).unwrap_or_default();
            let storage = e.new_array_storage();
            for group in groups {
                e.array_push(storage, Value::StringName(group));
            }

            // The return slot's handle becomes the only holder.
            e.assign_array(call.ret, storage);
        }),

        // CanvasItem
        ("CanvasItem", "set_modulate") => {
            let color = call.arg::<[f32; 4]>(0);
            with_engine(|e| update(e, object, |obj| obj.modulate = color));
        }
        ("CanvasItem", "get_modulate") => {
            let color = with_engine(|e| object_field(e, object, |obj| obj.modulate));
            call.ret(color.unwrap_or([1.0; 4]));
        }
        ("CanvasItem", "set_visible") => {
            let visible = call.arg::<u8>(0) != 0;
            with_engine(|e| update(e, object, |obj| obj.visible = visible));
        }
        ("CanvasItem", "is_visible") => {
            let visible = with_engine(|e| object_field(e, object, |obj| obj.visible));
            call.ret_bool(visible.unwrap_or(false));
        }

        // Node2D
        ("Node2D", "set_position") => {
            let position = call.arg::<[f32; 2]>(0);
            with_engine(|e| update(e, object, |obj| obj.position_2d = position));
        }
        ("Node2D", "get_position") => {
            let position = with_engine(|e| object_field(e, object, |obj| obj.position_2d));
            call.ret(position.unwrap_or_default());
        }
        ("Node2D", "set_rotation") => {
            let rotation = call.arg::<f64>(0);
            with_engine(|e| update(e, object, |obj| obj.rotation = rotation));
        }
        ("Node2D", "get_rotation") => {
            let rotation = with_engine(|e| object_field(e, object, |obj| obj.rotation));
            call.ret(rotation.unwrap_or(0.0));
        }

        // Node3D
        ("Node3D", "set_position") => {
            let position = call.arg::<[f32; 3]>(0);
            with_engine(|e| update(e, object, |obj| obj.position_3d = position));
        }
        ("Node3D", "get_position") => {
            let position = with_engine(|e| object_field(e, object, |obj| obj.position_3d));
            call.ret(position.unwrap_or_default());
        }

        // Echo: arguments come back unchanged.
        ("Echo", "echo_bool") => call.ret(call.arg::<u8>(0)),
        ("Echo", "echo_int") => call.ret(call.arg::<i64>(0)),
        ("Echo", "echo_float") => call.ret(call.arg::<f64>(0)),
        ("Echo", "echo_vector2") => call.ret(call.arg::<[f32; 2]>(0)),
        ("Echo", "echo_vector3") => call.ret(call.arg::<[f32; 3]>(0)),
        ("Echo", "echo_color") => call.ret(call.arg::<[f32; 4]>(0)),
        ("Echo", "echo_string") => {
            let text = string_arg(call.arg_ptr(0));
            with_engine(|e| e.assign_string(call.ret, text));
        }
        ("Echo", "echo_string_name") => {
            let text = string_name_arg(call.arg_ptr(0));
            with_engine(|e| e.assign_string_name(call.ret, text));
        }
        ("Echo", "echo_variant") => {
            let variant = read_id(call.arg_ptr(0));
            with_engine(|e| {
                let value = e.variant_value(variant);
                e.retain(&value);
                e.assign_variant(call.ret, value);
            });
        }
        ("Echo", "echo_array") => {
            let handle = read_id(call.arg_ptr(0));
            with_engine(|e| {
                if let Some(storage) = e.array_storage_of(handle) {
                    e.assign_array(call.ret, storage);
                }
            });
        }
        ("Echo", "echo_dictionary") => {
            let handle = read_id(call.arg_ptr(0));
            with_engine(|e| {
                if let Some(storage) = e.dictionary_storage_of(handle) {
                    e.assign_dictionary(call.ret, storage);
                }
            });
        }
        ("Echo", "echo_object") => call.ret_object(call.arg::<usize>(0)),
        ("Echo", "spawn_ref_counted") => {
            // The caller receives the only reference.
            let spawned = construct_by_name("RefCounted") as usize;
            if spawned != 0 {
                with_engine(|e| e.init_ref(spawned));
            }
            call.ret_object(spawned);
        }
        ("Echo", "sum16") => {
            let sum = (0..16).fold(0_i64, |sum, i| sum.wrapping_add(call.arg::<i64>(i)));
            call.ret(sum);
        }
        ("Echo", "set_value") => {
            let value = call.arg::<i64>(0);
            with_engine(|e| update(e, object, |obj| obj.echo_value = value));
        }
        ("Echo", "get_value") => {
            let value = with_engine(|e| object_field(e, object, |obj| obj.echo_value));
            call.ret(value.unwrap_or(0));
        }

        (class, method) => {
            with_engine(|e| e.violation(format!("method {class}::{method} has a bind, but no implementation")));
        }
    }
}

fn object_field<R>(e: &Engine, object: usize, f: impl FnOnce(&MockObject) -> R) -> Option<R> {
    e.objects.get(&object).map(f)
}

fn update(e: &mut Engine, object: usize, f: impl FnOnce(&mut MockObject)) {
    if let Some(obj) = e.objects.get_mut(&object) {
        f(obj);
    }
}
