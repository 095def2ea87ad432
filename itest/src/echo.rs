/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Façade of the mock engine's `Echo` class, declared the same way as the built-in engine classes.

use gdbind::builtin::{Array, Color, Dictionary, GString, StringName, Variant, Vector2, Vector3};
use gdbind::classes::{Object, RefCounted};
use gdbind::obj::{Constructible, EngineClass, Gd, GodotClass};
use gdbind::registry::EngineClassInfo;
use gdbind::sys::{self, BindError};

gdbind::private::engine_class! {
    /// Engine class whose methods return their arguments unchanged.
    pub struct Echo: RefCounted, MemRefCounted, Scene;
}

impl Constructible for Echo {}

gdbind::private::class_macros::inherits_transitive_RefCounted!(Echo);

sys::method_table! {
    pub struct EchoMethods in ECHO_METHODS for "Echo" {
        echo_bool = 1000001 => Owned,
        echo_int = 1000002 => Owned,
        echo_float = 1000003 => Owned,
        echo_vector2 = 1000004 => Owned,
        echo_vector3 = 1000005 => Owned,
        echo_color = 1000006 => Owned,
        echo_string = 1000007 => Owned,
        echo_string_name = 1000008 => Owned,
        echo_variant = 1000009 => Owned,
        echo_array = 1000010 => Owned,
        echo_dictionary = 1000011 => Owned,
        echo_object = 1000012 => Borrowed,
        spawn_ref_counted = 1000013 => Owned,
        sum16 = 1000014 => Owned,
        set_value = 1000015 => Owned,
        get_value = 1000016 => Owned,
    }
}

/// Registry entry; the method table is loaded at the `Scene` level.
pub fn class_info() -> EngineClassInfo {
    EngineClassInfo::of::<Echo>(load_tables)
}

fn load_tables() -> Result<(), BindError> {
    ECHO_METHODS.initialize(EchoMethods::try_load()?);
    Ok(())
}

macro_rules! echo_ptrcall {
    ($method:ident ($receiver:expr) $(, $arg:expr)* => $Ret:ty) => {{
        let method = &ECHO_METHODS.get().$method;
        let arity = <[&str]>::len(&[$( stringify!($arg) ),*]);

        // SAFETY: the receiver is a live Echo; arguments and return type follow the engine signature.
        unsafe {
            gdbind::meta::signature::out_class_ptrcall::<$Ret>(method, $receiver, arity, |frame| {
                $( frame.arg($arg); )*
            })
        }
    }};
}

impl Echo {
    pub fn echo_bool(&self, value: bool) -> bool {
        echo_ptrcall!(echo_bool(self.obj_sys()), value => bool)
    }

    pub fn echo_int(&self, value: i64) -> i64 {
        echo_ptrcall!(echo_int(self.obj_sys()), value => i64)
    }

    /// Same method bind as `echo_int`; `i32` travels as a 64-bit integer.
    pub fn echo_i32(&self, value: i32) -> i32 {
        echo_ptrcall!(echo_int(self.obj_sys()), value => i32)
    }

    pub fn echo_float(&self, value: f64) -> f64 {
        echo_ptrcall!(echo_float(self.obj_sys()), value => f64)
    }

    pub fn echo_f32(&self, value: f32) -> f32 {
        echo_ptrcall!(echo_float(self.obj_sys()), value => f32)
    }

    pub fn echo_vector2(&self, value: Vector2) -> Vector2 {
        echo_ptrcall!(echo_vector2(self.obj_sys()), value => Vector2)
    }

    pub fn echo_vector3(&self, value: Vector3) -> Vector3 {
        echo_ptrcall!(echo_vector3(self.obj_sys()), value => Vector3)
    }

    pub fn echo_color(&self, value: Color) -> Color {
        echo_ptrcall!(echo_color(self.obj_sys()), value => Color)
    }

    pub fn echo_string(&self, value: &GString) -> GString {
        echo_ptrcall!(echo_string(self.obj_sys()), value => GString)
    }

    /// Passes a Rust string slice, converted to a temporary engine string.
    pub fn echo_str(&self, value: &str) -> GString {
        echo_ptrcall!(echo_string(self.obj_sys()), value => GString)
    }

    pub fn echo_string_name(&self, value: &StringName) -> StringName {
        echo_ptrcall!(echo_string_name(self.obj_sys()), value => StringName)
    }

    pub fn echo_variant(&self, value: &Variant) -> Variant {
        echo_ptrcall!(echo_variant(self.obj_sys()), value => Variant)
    }

    pub fn echo_array(&self, value: &Array) -> Array {
        echo_ptrcall!(echo_array(self.obj_sys()), value => Array)
    }

    pub fn echo_dictionary(&self, value: &Dictionary) -> Dictionary {
        echo_ptrcall!(echo_dictionary(self.obj_sys()), value => Dictionary)
    }

    /// The result is borrowed: the engine keeps no reference for the caller.
    pub fn echo_object<T: GodotClass>(&self, value: &Gd<T>) -> Option<Gd<Object>> {
        echo_ptrcall!(echo_object(self.obj_sys()), value => Option<Gd<Object>>)
    }

    /// New object; the caller holds its only reference.
    pub fn spawn_ref_counted(&self) -> Option<Gd<RefCounted>> {
        echo_ptrcall!(spawn_ref_counted(self.obj_sys()) => Option<Gd<RefCounted>>)
    }

    /// Sum of exactly 16 values. Other lengths panic in the call frame.
    pub fn sum16(&self, values: &[i64]) -> i64 {
        let method = &ECHO_METHODS.get().sum16;

        // SAFETY: live receiver; 16 integer arguments as the signature requires, unless the frame rejects them.
        unsafe {
            gdbind::meta::signature::out_class_ptrcall::<i64>(method, self.obj_sys(), 16, |frame| {
                for value in values {
                    frame.arg(*value);
                }
            })
        }
    }

    pub fn set_value(&mut self, value: i64) {
        echo_ptrcall!(set_value(self.obj_sys()), value => ())
    }

    pub fn get_value(&self) -> i64 {
        echo_ptrcall!(get_value(self.obj_sys()) => i64)
    }
}
