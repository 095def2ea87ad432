/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Constructors, destructors and builtin methods of the payload types, resolved once at startup.

use std::ffi::c_int;

use crate as sys;
use crate::{BindError, GDExtensionInterface, StringCache};

pub type PtrConstructorFn =
    unsafe extern "C" fn(p_base: sys::GDExtensionUninitializedTypePtr, p_args: *const sys::GDExtensionConstTypePtr);
pub type PtrDestructorFn = unsafe extern "C" fn(p_base: sys::GDExtensionTypePtr);
pub type BuiltinMethodFn = unsafe extern "C" fn(
    p_base: sys::GDExtensionTypePtr,
    p_args: *const sys::GDExtensionConstTypePtr,
    r_return: sys::GDExtensionTypePtr,
    p_argument_count: c_int,
);
pub type VariantFromTypeFn =
    unsafe extern "C" fn(r_dest: sys::GDExtensionUninitializedVariantPtr, p_src: sys::GDExtensionTypePtr);
pub type VariantToTypeFn =
    unsafe extern "C" fn(r_dest: sys::GDExtensionUninitializedTypePtr, p_src: sys::GDExtensionVariantPtr);

macro_rules! variant_converters {
    ( $( $from:ident, $to:ident = $variant_type:ident; )* ) => {
        /// Conversions between variants and the types the binding understands.
        #[derive(Debug)]
        pub struct VariantConverters {
            $(
                pub $from: VariantFromTypeFn,
                pub $to: VariantToTypeFn,
            )*
        }

        impl VariantConverters {
            unsafe fn load(interface: &GDExtensionInterface) -> Result<Self, BindError> {
                Ok(Self {
                    $(
                        $from: validate(
                            (interface.get_variant_from_type_constructor)(sys::$variant_type),
                            concat!("Variant <- ", stringify!($variant_type)),
                        )?,
                        $to: validate(
                            (interface.get_variant_to_type_constructor)(sys::$variant_type),
                            concat!("Variant -> ", stringify!($variant_type)),
                        )?,
                    )*
                })
            }
        }
    };
}

variant_converters! {
    bool_to_variant, bool_from_variant = GDEXTENSION_VARIANT_TYPE_BOOL;
    int_to_variant, int_from_variant = GDEXTENSION_VARIANT_TYPE_INT;
    float_to_variant, float_from_variant = GDEXTENSION_VARIANT_TYPE_FLOAT;
    string_to_variant, string_from_variant = GDEXTENSION_VARIANT_TYPE_STRING;
    vector2_to_variant, vector2_from_variant = GDEXTENSION_VARIANT_TYPE_VECTOR2;
    vector3_to_variant, vector3_from_variant = GDEXTENSION_VARIANT_TYPE_VECTOR3;
    color_to_variant, color_from_variant = GDEXTENSION_VARIANT_TYPE_COLOR;
    string_name_to_variant, string_name_from_variant = GDEXTENSION_VARIANT_TYPE_STRING_NAME;
    object_to_variant, object_from_variant = GDEXTENSION_VARIANT_TYPE_OBJECT;
    dictionary_to_variant, dictionary_from_variant = GDEXTENSION_VARIANT_TYPE_DICTIONARY;
    array_to_variant, array_from_variant = GDEXTENSION_VARIANT_TYPE_ARRAY;
}

/// Lifecycle functions of `String`, `StringName`, `Array` and `Dictionary`, plus variant conversions.
#[derive(Debug)]
pub struct BuiltinLifecycleTable {
    pub string_construct_default: PtrConstructorFn,
    pub string_construct_copy: PtrConstructorFn,
    pub string_from_string_name: PtrConstructorFn,
    pub string_destroy: PtrDestructorFn,
    pub string_length: BuiltinMethodFn,

    pub string_name_construct_default: PtrConstructorFn,
    pub string_name_construct_copy: PtrConstructorFn,
    pub string_name_from_string: PtrConstructorFn,
    pub string_name_destroy: PtrDestructorFn,

    pub array_construct_default: PtrConstructorFn,
    pub array_construct_copy: PtrConstructorFn,
    pub array_destroy: PtrDestructorFn,
    pub array_size: BuiltinMethodFn,
    pub array_push_back: BuiltinMethodFn,
    pub array_clear: BuiltinMethodFn,

    pub dictionary_construct_default: PtrConstructorFn,
    pub dictionary_construct_copy: PtrConstructorFn,
    pub dictionary_destroy: PtrDestructorFn,
    pub dictionary_size: BuiltinMethodFn,
    pub dictionary_has: BuiltinMethodFn,
    pub dictionary_clear: BuiltinMethodFn,

    pub variant: VariantConverters,
}

impl BuiltinLifecycleTable {
    /// # Safety
    /// `interface` must stem from a loaded engine.
    pub unsafe fn load(interface: &GDExtensionInterface) -> Result<Self, BindError> {
        use sys::{
            GDEXTENSION_VARIANT_TYPE_ARRAY as ARRAY, GDEXTENSION_VARIANT_TYPE_DICTIONARY as DICTIONARY,
            GDEXTENSION_VARIANT_TYPE_STRING as STRING, GDEXTENSION_VARIANT_TYPE_STRING_NAME as STRING_NAME,
        };

        let ctor = |ty, index, description| validate((interface.variant_get_ptr_constructor)(ty, index), description);
        let dtor = |ty, description| validate((interface.variant_get_ptr_destructor)(ty), description);

        // Builtin methods are looked up by name, which needs StringName destruction available first.
        let string_name_destroy = dtor(STRING_NAME, "StringName::~StringName")?;

        let mut string_names = StringCache::new(interface, string_name_destroy);
        let mut method = |ty, name: &'static str, hash: i64, description| {
            let name_ptr = string_names.fetch(name);
            validate((interface.variant_get_ptr_builtin_method)(ty, name_ptr, hash), description)
        };

        Ok(Self {
            string_construct_default: ctor(STRING, 0, "String::String()")?,
            string_construct_copy: ctor(STRING, 1, "String::String(String)")?,
            string_from_string_name: ctor(STRING, 2, "String::String(StringName)")?,
            string_destroy: dtor(STRING, "String::~String")?,
            string_length: method(STRING, "length", 3173160232, "String::length")?,

            string_name_construct_default: ctor(STRING_NAME, 0, "StringName::StringName()")?,
            string_name_construct_copy: ctor(STRING_NAME, 1, "StringName::StringName(StringName)")?,
            string_name_from_string: ctor(STRING_NAME, 2, "StringName::StringName(String)")?,
            string_name_destroy,

            array_construct_default: ctor(ARRAY, 0, "Array::Array()")?,
            array_construct_copy: ctor(ARRAY, 1, "Array::Array(Array)")?,
            array_destroy: dtor(ARRAY, "Array::~Array")?,
            array_size: method(ARRAY, "size", 3173160232, "Array::size")?,
            array_push_back: method(ARRAY, "push_back", 3316032543, "Array::push_back")?,
            array_clear: method(ARRAY, "clear", 3218959716, "Array::clear")?,

            dictionary_construct_default: ctor(DICTIONARY, 0, "Dictionary::Dictionary()")?,
            dictionary_construct_copy: ctor(DICTIONARY, 1, "Dictionary::Dictionary(Dictionary)")?,
            dictionary_destroy: dtor(DICTIONARY, "Dictionary::~Dictionary")?,
            dictionary_size: method(DICTIONARY, "size", 3173160232, "Dictionary::size")?,
            dictionary_has: method(DICTIONARY, "has", 3680194679, "Dictionary::has")?,
            dictionary_clear: method(DICTIONARY, "clear", 3218959716, "Dictionary::clear")?,

            variant: VariantConverters::load(interface)?,
        })
    }
}

fn validate<T>(function: Option<T>, description: &'static str) -> Result<T, BindError> {
    function.ok_or(BindError::MissingLifecycleFn { description })
}
