/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbind_ffi as sys;
use sys::BindError;

use crate::builtin::GString;
use crate::classes::{class_ptrcall, Object};
use crate::obj::{Constructible, GodotClass};

crate::engine_class! {
    /// Base class of all reference-counted objects.
    ///
    /// Handles of reference-counted classes hold one reference each; the object is destroyed when the last one goes.
    pub struct RefCounted: Object, MemRefCounted, Core;
}

impl Constructible for RefCounted {}

crate::inherits_transitive_Object!(RefCounted);

sys::method_table! {
    pub(crate) struct RefCountedMethods in REF_COUNTED_METHODS for "RefCounted" {
        init_ref = 2240911060 => Owned,
        reference = 2240911060 => Owned,
        unreference = 2240911060 => Owned,
        get_reference_count = 3905245786 => Owned,
    }
}

pub(crate) fn load_tables() -> Result<(), BindError> {
    REF_COUNTED_METHODS.initialize(RefCountedMethods::try_load()?);
    Ok(())
}

impl RefCounted {
    pub fn get_reference_count(&self) -> i32 {
        class_ptrcall!(REF_COUNTED_METHODS.get_reference_count(self.object_ptr) => i32)
    }
}

// Reference-count primitives for Gd<T>, usable on any object known to be reference-counted.

/// Takes the initial reference of a freshly constructed object.
///
/// # Safety
/// `obj` must be a live reference-counted object.
pub(crate) unsafe fn raw_init_ref(obj: sys::GDExtensionObjectPtr) {
    class_ptrcall!(REF_COUNTED_METHODS.init_ref(obj) => bool);
}

/// # Safety
/// `obj` must be a live reference-counted object.
pub(crate) unsafe fn raw_reference(obj: sys::GDExtensionObjectPtr) {
    class_ptrcall!(REF_COUNTED_METHODS.reference(obj) => bool);
}

/// Releases one reference. Returns `true` if it was the last one, in which case the caller destroys the object.
///
/// # Safety
/// `obj` must be a live reference-counted object, and the caller must own the released reference.
pub(crate) unsafe fn raw_unreference(obj: sys::GDExtensionObjectPtr) -> bool {
    class_ptrcall!(REF_COUNTED_METHODS.unreference(obj) => bool)
}

/// Virtual methods of `RefCounted`.
#[allow(unused_variables)]
pub trait IRefCounted: GodotClass + crate::private::You_forgot_the_attribute__godot_api {
    object_callback_methods!();

    fn to_string(&self) -> GString {
        unimplemented!()
    }
}
