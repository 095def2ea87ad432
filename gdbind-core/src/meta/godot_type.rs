/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::{Array, Color, Dictionary, GString, StringName, Variant, VariantType, Vector2, Vector3};
use crate::meta::PropertyInfo;
use crate::obj::{Gd, GodotClass};

/// Rust type with a fixed engine type, usable in the signature of a method registered with the engine.
pub trait GodotType {
    fn variant_type() -> VariantType;

    /// Class of object types; empty for all others.
    fn class_name() -> &'static str {
        ""
    }

    /// Property usage flags for parameters and return values of this type.
    fn usage() -> u32 {
        PropertyInfo::USAGE_DEFAULT
    }
}

macro_rules! impl_godot_type {
    ($($T:ty => $VariantType:ident),* $(,)?) => {
        $(
            impl GodotType for $T {
                fn variant_type() -> VariantType {
                    VariantType::$VariantType
                }
            }
        )*
    };
}

impl_godot_type! {
    () => Nil,
    bool => Bool,
    i64 => Int,
    i32 => Int,
    f64 => Float,
    f32 => Float,
    GString => String,
    StringName => StringName,
    Vector2 => Vector2,
    Vector3 => Vector3,
    Color => Color,
    Array => Array,
    Dictionary => Dictionary,
}

/// Any type; the engine checks nothing.
impl GodotType for Variant {
    fn variant_type() -> VariantType {
        VariantType::Nil
    }

    fn usage() -> u32 {
        PropertyInfo::USAGE_DEFAULT | PropertyInfo::USAGE_NIL_IS_VARIANT
    }
}

impl<T: GodotClass> GodotType for Gd<T> {
    fn variant_type() -> VariantType {
        VariantType::Object
    }

    fn class_name() -> &'static str {
        T::CLASS_NAME
    }
}

impl<T: GodotClass> GodotType for Option<Gd<T>> {
    fn variant_type() -> VariantType {
        VariantType::Object
    }

    fn class_name() -> &'static str {
        T::CLASS_NAME
    }
}
