/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbind_ffi as sys;
use sys::BindError;

use crate::builtin::{GString, StringName, ToGodot, Variant};
use crate::classes::class_ptrcall;
use crate::obj::{GodotClass, MemDynamic, NoBase};

/// Root of the class hierarchy.
///
/// `Object` handles may point to reference-counted or manually managed instances; which one is decided per
/// instance.
#[repr(C)]
pub struct Object {
    object_ptr: sys::GDExtensionObjectPtr,
}

impl GodotClass for Object {
    type Base = NoBase;
    type Memory = MemDynamic;

    const CLASS_NAME: &'static str = "Object";
    const INIT_LEVEL: sys::InitLevel = sys::InitLevel::Core;
}

// SAFETY: #[repr(C)] struct with a single object pointer field.
unsafe impl crate::obj::EngineClass for Object {
    fn obj_sys(&self) -> sys::GDExtensionObjectPtr {
        self.object_ptr
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Object({:p})", self.object_ptr)
    }
}

sys::method_table! {
    pub(crate) struct ObjectMethods in OBJECT_METHODS for "Object" {
        get_class = 201670096 => Owned,
        is_class = 3927539163 => Owned,
        get_instance_id = 3905245786 => Owned,
        set_meta = 3776071444 => Owned,
        get_meta = 3990617847 => Owned,
        has_meta = 2619796661 => Owned,
    }
}

pub(crate) fn load_tables() -> Result<(), BindError> {
    OBJECT_METHODS.initialize(ObjectMethods::try_load()?);
    Ok(())
}

impl Object {
    /// Runtime class name, as reported by the engine.
    pub fn get_class(&self) -> GString {
        class_ptrcall!(OBJECT_METHODS.get_class(self.object_ptr) => GString)
    }

    /// Whether the object is an instance of `class` or one of its subclasses.
    pub fn is_class(&self, class: &str) -> bool {
        class_ptrcall!(OBJECT_METHODS.is_class(self.object_ptr), class => bool)
    }

    pub fn get_instance_id(&self) -> i64 {
        class_ptrcall!(OBJECT_METHODS.get_instance_id(self.object_ptr) => i64)
    }

    pub fn set_meta(&mut self, name: &str, value: impl ToGodot) {
        let name = StringName::from(name);
        let value = value.to_variant();
        class_ptrcall!(OBJECT_METHODS.set_meta(self.object_ptr), &name, &value => ())
    }

    /// Metadata entry `name`, or nil if absent.
    pub fn get_meta(&self, name: &str) -> Variant {
        let name = StringName::from(name);
        let default = Variant::nil();
        class_ptrcall!(OBJECT_METHODS.get_meta(self.object_ptr), &name, &default => Variant)
    }

    pub fn has_meta(&self, name: &str) -> bool {
        let name = StringName::from(name);
        class_ptrcall!(OBJECT_METHODS.has_meta(self.object_ptr), &name => bool)
    }
}

/// Virtual methods of `Object`.
#[allow(unused_variables)]
pub trait IObject: GodotClass + crate::private::You_forgot_the_attribute__godot_api {
    object_callback_methods!();

    /// String representation, used by the engine's `str()`.
    fn to_string(&self) -> GString {
        unimplemented!()
    }
}
