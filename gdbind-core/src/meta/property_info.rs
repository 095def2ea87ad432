/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbind_ffi as sys;

use crate::builtin::{GString, StringName, VariantType};
use crate::meta::GodotType;

/// Describes a property, as reported in property lists and in method signatures.
#[derive(Clone, Debug)]
pub struct PropertyInfo {
    pub variant_type: VariantType,
    pub property_name: StringName,

    /// Class of object properties; empty otherwise.
    pub class_name: StringName,
    pub hint: u32,
    pub hint_string: GString,
    pub usage: u32,
}

impl PropertyInfo {
    pub const HINT_NONE: u32 = 0;
    pub const HINT_RANGE: u32 = 1;
    pub const HINT_ENUM: u32 = 2;

    pub const USAGE_NONE: u32 = 0;
    pub const USAGE_STORAGE: u32 = 2;
    pub const USAGE_EDITOR: u32 = 4;
    pub const USAGE_DEFAULT: u32 = Self::USAGE_STORAGE | Self::USAGE_EDITOR;
    pub const USAGE_NIL_IS_VARIANT: u32 = 131072;

    /// Property `name` of type `variant_type`, stored and shown in the editor.
    pub fn new(name: &str, variant_type: VariantType) -> Self {
        Self {
            variant_type,
            property_name: StringName::from(name),
            class_name: StringName::default(),
            hint: Self::HINT_NONE,
            hint_string: GString::new(),
            usage: Self::USAGE_DEFAULT,
        }
    }

    /// Property `name` declared with Rust type `T`.
    pub fn of<T: GodotType>(name: &str) -> Self {
        Self {
            class_name: StringName::from(T::class_name()),
            usage: T::usage(),
            ..Self::new(name, T::variant_type())
        }
    }

    pub fn with_hint(self, hint: u32, hint_string: &str) -> Self {
        Self {
            hint,
            hint_string: GString::from(hint_string),
            ..self
        }
    }

    pub fn with_usage(self, usage: u32) -> Self {
        Self { usage, ..self }
    }

    /// Record pointing into `self`; valid as long as `self` is neither moved nor dropped.
    pub(crate) fn property_sys(&self) -> sys::GDExtensionPropertyInfo {
        sys::GDExtensionPropertyInfo {
            type_: self.variant_type.sys(),
            name: self.property_name.sys() as sys::GDExtensionStringNamePtr,
            class_name: self.class_name.sys() as sys::GDExtensionStringNamePtr,
            hint: self.hint,
            hint_string: self.hint_string.sys() as sys::GDExtensionStringPtr,
            usage: self.usage,
        }
    }

    /// Record owning its strings, to be released with [`free_owned_property_sys()`](Self::free_owned_property_sys).
    pub(crate) fn into_owned_property_sys(self) -> sys::GDExtensionPropertyInfo {
        // Boxed handles keep their address; a pointer to the handle is a pointer to the native value.
        sys::GDExtensionPropertyInfo {
            type_: self.variant_type.sys(),
            name: Box::into_raw(Box::new(self.property_name)) as sys::GDExtensionStringNamePtr,
            class_name: Box::into_raw(Box::new(self.class_name)) as sys::GDExtensionStringNamePtr,
            hint: self.hint,
            hint_string: Box::into_raw(Box::new(self.hint_string)) as sys::GDExtensionStringPtr,
            usage: self.usage,
        }
    }

    /// # Safety
    /// `info` must come from [`into_owned_property_sys()`](Self::into_owned_property_sys), and be freed only once.
    pub(crate) unsafe fn free_owned_property_sys(info: sys::GDExtensionPropertyInfo) {
        drop(Box::from_raw(info.name as *mut StringName));
        drop(Box::from_raw(info.class_name as *mut StringName));
        drop(Box::from_raw(info.hint_string as *mut GString));
    }
}
