/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use gdbind_ffi as sys;
use sys::interface_fn;

use crate::builtin::macros::impl_builtin_handle;
use crate::builtin::{Array, Color, Dictionary, GString, StringName, Vector2, Vector3};
use crate::handle::{HandleKind, HandleState};
use crate::meta::ConvertError;
use crate::obj::{Gd, GodotClass};

/// Dynamically typed value of the engine.
///
/// Holds one of the [`VariantType`]s. Conversions go through [`ToGodot`] and [`FromGodot`].
#[repr(C)]
pub struct Variant {
    opaque: sys::OpaqueVariant,
    state: HandleState,
}

impl Variant {
    /// The `Nil` variant.
    pub fn nil() -> Self {
        Self::new_default()
    }

    pub fn is_nil(&self) -> bool {
        self.get_type() == VariantType::Nil
    }

    /// Type currently stored in the variant.
    pub fn get_type(&self) -> VariantType {
        // SAFETY: variant is initialized.
        let raw = unsafe { interface_fn!(variant_get_type)(self.sys()) };
        VariantType::from_sys(raw)
    }

    /// Converts to `T`, or returns an error naming both types.
    pub fn try_to<T: FromGodot>(&self) -> Result<T, ConvertError> {
        T::try_from_variant(self)
    }

    /// Converts to `T`.
    ///
    /// # Panics
    /// If the variant holds a different type.
    pub fn to<T: FromGodot>(&self) -> T {
        self.try_to().unwrap_or_else(|err| panic!("Variant::to() failed: {err}"))
    }

    /// Creates a variant through one of the engine's type-to-variant converters.
    ///
    /// # Safety
    /// `converter` must accept a pointer to `raw` as its source.
    unsafe fn from_raw<R>(converter: sys::VariantFromTypeFn, raw: &R) -> Self {
        let src = sys::force_mut_ptr(raw as *const R) as sys::GDExtensionTypePtr;
        Self::new_with_uninit(|dest| converter(dest, src))
    }

    /// Writes the variant's payload through one of the engine's variant-to-type converters.
    ///
    /// # Safety
    /// `dest` must be valid storage for the target type of `converter`.
    unsafe fn to_raw(&self, converter: sys::VariantToTypeFn, dest: sys::GDExtensionUninitializedTypePtr) {
        converter(dest, sys::force_mut_ptr(self.sys()));
    }

    fn expect_type(&self, expected: VariantType) -> Result<(), ConvertError> {
        let actual = self.get_type();
        if actual == expected {
            Ok(())
        } else {
            Err(ConvertError::new(expected, actual))
        }
    }
}

impl_builtin_handle! {
    Variant: OpaqueVariant, HandleKind::Variant;
    default(dest) => interface_fn!(variant_new_nil)(dest),
    copy(dest, src) => interface_fn!(variant_new_copy)(dest, src),
    destroy(ptr) => interface_fn!(variant_destroy)(ptr),
}

impl Default for Variant {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variant({:?}, {})", self.get_type(), self.ownership())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Variant types

/// Types a [`Variant`] can hold, as far as this binding knows them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VariantType {
    Nil,
    Bool,
    Int,
    Float,
    String,
    Vector2,
    Vector3,
    Color,
    StringName,
    Object,
    Dictionary,
    Array,

    /// Any engine type without a Rust counterpart here; holds the engine's ordinal.
    Other(i32),
}

impl VariantType {
    #[doc(hidden)]
    pub fn from_sys(raw: sys::GDExtensionVariantType) -> Self {
        match raw {
            sys::GDEXTENSION_VARIANT_TYPE_NIL => Self::Nil,
            sys::GDEXTENSION_VARIANT_TYPE_BOOL => Self::Bool,
            sys::GDEXTENSION_VARIANT_TYPE_INT => Self::Int,
            sys::GDEXTENSION_VARIANT_TYPE_FLOAT => Self::Float,
            sys::GDEXTENSION_VARIANT_TYPE_STRING => Self::String,
            sys::GDEXTENSION_VARIANT_TYPE_VECTOR2 => Self::Vector2,
            sys::GDEXTENSION_VARIANT_TYPE_VECTOR3 => Self::Vector3,
            sys::GDEXTENSION_VARIANT_TYPE_COLOR => Self::Color,
            sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME => Self::StringName,
            sys::GDEXTENSION_VARIANT_TYPE_OBJECT => Self::Object,
            sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY => Self::Dictionary,
            sys::GDEXTENSION_VARIANT_TYPE_ARRAY => Self::Array,
            other => Self::Other(other),
        }
    }

    #[doc(hidden)]
    pub fn sys(self) -> sys::GDExtensionVariantType {
        match self {
            Self::Nil => sys::GDEXTENSION_VARIANT_TYPE_NIL,
            Self::Bool => sys::GDEXTENSION_VARIANT_TYPE_BOOL,
            Self::Int => sys::GDEXTENSION_VARIANT_TYPE_INT,
            Self::Float => sys::GDEXTENSION_VARIANT_TYPE_FLOAT,
            Self::String => sys::GDEXTENSION_VARIANT_TYPE_STRING,
            Self::Vector2 => sys::GDEXTENSION_VARIANT_TYPE_VECTOR2,
            Self::Vector3 => sys::GDEXTENSION_VARIANT_TYPE_VECTOR3,
            Self::Color => sys::GDEXTENSION_VARIANT_TYPE_COLOR,
            Self::StringName => sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME,
            Self::Object => sys::GDEXTENSION_VARIANT_TYPE_OBJECT,
            Self::Dictionary => sys::GDEXTENSION_VARIANT_TYPE_DICTIONARY,
            Self::Array => sys::GDEXTENSION_VARIANT_TYPE_ARRAY,
            Self::Other(ord) => ord,
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Conversion traits

/// Conversion of a Rust value into a [`Variant`].
pub trait ToGodot {
    fn to_variant(&self) -> Variant;
}

/// Conversion of a [`Variant`] into a Rust value.
pub trait FromGodot: Sized {
    /// Converts, or fails if the variant holds a different type.
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError>;

    /// Converts, panicking on type mismatch.
    fn from_variant(variant: &Variant) -> Self {
        variant.to()
    }
}

impl ToGodot for Variant {
    fn to_variant(&self) -> Variant {
        self.clone()
    }
}

/// Methods without return value report nil.
impl ToGodot for () {
    fn to_variant(&self) -> Variant {
        Variant::nil()
    }
}

impl FromGodot for Variant {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        Ok(variant.clone())
    }
}

/// Conversions for plain values. `$Raw` is the engine's representation (int is always 64-bit, float always double).
macro_rules! impl_variant_scalar {
    ($( $T:ty as $Raw:ty: $VariantType:ident, $to:ident, $from:ident; )*) => {
        $(
            impl ToGodot for $T {
                fn to_variant(&self) -> Variant {
                    let raw = <$Raw>::from(*self);

                    // SAFETY: converter reads a value of the engine's representation.
                    unsafe { Variant::from_raw(sys::builtin_fn!(variant.$to), &raw) }
                }
            }

            impl FromGodot for $T {
                fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
                    variant.expect_type(VariantType::$VariantType)?;

                    let mut raw = <$Raw>::default();
                    // SAFETY: type checked above; destination has the engine's representation.
                    unsafe { variant.to_raw(sys::builtin_fn!(variant.$from), &mut raw as *mut $Raw as _) };

                    scalar_from_raw(raw)
                }
            }
        )*
    };
}

trait ScalarFromRaw<Raw>: Sized {
    fn scalar_from_raw(raw: Raw) -> Result<Self, ConvertError>;
}

fn scalar_from_raw<Raw, T: ScalarFromRaw<Raw>>(raw: Raw) -> Result<T, ConvertError> {
    T::scalar_from_raw(raw)
}

impl ScalarFromRaw<u8> for bool {
    fn scalar_from_raw(raw: u8) -> Result<Self, ConvertError> {
        Ok(sys::conv::bool_from_sys(raw))
    }
}

impl ScalarFromRaw<i64> for i64 {
    fn scalar_from_raw(raw: i64) -> Result<Self, ConvertError> {
        Ok(raw)
    }
}

impl ScalarFromRaw<i64> for i32 {
    fn scalar_from_raw(raw: i64) -> Result<Self, ConvertError> {
        i32::try_from(raw).map_err(|_| ConvertError::out_of_range(VariantType::Int, raw))
    }
}

impl ScalarFromRaw<f64> for f64 {
    fn scalar_from_raw(raw: f64) -> Result<Self, ConvertError> {
        Ok(raw)
    }
}

impl ScalarFromRaw<f64> for f32 {
    fn scalar_from_raw(raw: f64) -> Result<Self, ConvertError> {
        Ok(raw as f32)
    }
}

impl_variant_scalar! {
    bool as u8: Bool, bool_to_variant, bool_from_variant;
    i64 as i64: Int, int_to_variant, int_from_variant;
    i32 as i64: Int, int_to_variant, int_from_variant;
    f64 as f64: Float, float_to_variant, float_from_variant;
    f32 as f64: Float, float_to_variant, float_from_variant;
}

/// Conversions for `#[repr(C)]` builtins stored by value.
macro_rules! impl_variant_pod {
    ($( $T:ident: $to:ident, $from:ident; )*) => {
        $(
            impl ToGodot for $T {
                fn to_variant(&self) -> Variant {
                    // SAFETY: converter reads a value of the engine's representation.
                    unsafe { Variant::from_raw(sys::builtin_fn!(variant.$to), self) }
                }
            }

            impl FromGodot for $T {
                fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
                    variant.expect_type(VariantType::$T)?;

                    let mut value = $T::default();
                    // SAFETY: type checked above; destination has the engine's representation.
                    unsafe { variant.to_raw(sys::builtin_fn!(variant.$from), &mut value as *mut $T as _) };
                    Ok(value)
                }
            }
        )*
    };
}

impl_variant_pod! {
    Vector2: vector2_to_variant, vector2_from_variant;
    Vector3: vector3_to_variant, vector3_from_variant;
    Color: color_to_variant, color_from_variant;
}

/// Conversions for opaque payload handles. The variant stores a copy; extraction yields an owned handle.
macro_rules! impl_variant_payload {
    ($( $T:ident: $VariantType:ident, $to:ident, $from:ident; )*) => {
        $(
            impl ToGodot for $T {
                fn to_variant(&self) -> Variant {
                    let src = sys::force_mut_ptr(self.sys());

                    // SAFETY: converter copies from a live payload.
                    unsafe { Variant::new_with_uninit(|dest| sys::builtin_fn!(variant.$to)(dest, src)) }
                }
            }

            impl FromGodot for $T {
                fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
                    variant.expect_type(VariantType::$VariantType)?;

                    // SAFETY: type checked above; converter initializes the payload.
                    let value = unsafe {
                        $T::new_with_uninit(|dest| variant.to_raw(sys::builtin_fn!(variant.$from), dest))
                    };
                    Ok(value)
                }
            }
        )*
    };
}

impl_variant_payload! {
    GString: String, string_to_variant, string_from_variant;
    StringName: StringName, string_name_to_variant, string_name_from_variant;
    Array: Array, array_to_variant, array_from_variant;
    Dictionary: Dictionary, dictionary_to_variant, dictionary_from_variant;
}

impl<T: ToGodot + ?Sized> ToGodot for &T {
    fn to_variant(&self) -> Variant {
        (**self).to_variant()
    }
}

impl ToGodot for str {
    fn to_variant(&self) -> Variant {
        GString::from(self).to_variant()
    }
}

impl ToGodot for String {
    fn to_variant(&self) -> Variant {
        GString::from(self.as_str()).to_variant()
    }
}

impl FromGodot for String {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        GString::try_from_variant(variant).map(|s| s.to_rust_string())
    }
}

impl<T: GodotClass> ToGodot for Gd<T> {
    fn to_variant(&self) -> Variant {
        let obj = self.obj_sys();

        // SAFETY: converter reads an object pointer; the variant takes its own reference if the object is ref-counted.
        unsafe { Variant::from_raw(sys::builtin_fn!(variant.object_to_variant), &obj) }
    }
}

impl<T: GodotClass> FromGodot for Gd<T> {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        variant.expect_type(VariantType::Object)?;

        let mut obj: sys::GDExtensionObjectPtr = std::ptr::null_mut();
        // SAFETY: type checked above; destination is an object pointer.
        unsafe {
            variant.to_raw(
                sys::builtin_fn!(variant.object_from_variant),
                &mut obj as *mut sys::GDExtensionObjectPtr as _,
            )
        };

        if obj.is_null() {
            return Err(ConvertError::null_object(T::CLASS_NAME));
        }

        // The variant keeps the object alive; the new handle takes its own reference via clone().
        // SAFETY: non-null live object.
        let borrowed = unsafe { Gd::<crate::classes::Object>::from_obj_sys_borrowed(obj) };
        borrowed
            .clone()
            .try_cast::<T>()
            .map_err(|obj| ConvertError::wrong_class(T::CLASS_NAME, obj.dynamic_class_name()))
    }
}

impl<T: GodotClass> ToGodot for Option<Gd<T>> {
    fn to_variant(&self) -> Variant {
        match self {
            Some(gd) => gd.to_variant(),
            None => Variant::nil(),
        }
    }
}

impl<T: GodotClass> FromGodot for Option<Gd<T>> {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        if variant.is_nil() {
            Ok(None)
        } else {
            Gd::try_from_variant(variant).map(Some)
        }
    }
}

macro_rules! impl_variant_from {
    ($($T:ty),* $(,)?) => {
        $(
            impl From<$T> for Variant {
                fn from(value: $T) -> Self {
                    value.to_variant()
                }
            }
        )*
    };
}

impl_variant_from!(bool, i64, i32, f64, f32, &str, String, Vector2, Vector3, Color);

impl From<&GString> for Variant {
    fn from(value: &GString) -> Self {
        value.to_variant()
    }
}

impl From<&StringName> for Variant {
    fn from(value: &StringName) -> Self {
        value.to_variant()
    }
}
