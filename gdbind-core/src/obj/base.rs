/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::mem::ManuallyDrop;

use gdbind_ffi as sys;

use crate::obj::{Gd, GodotClass};

/// Restricted version of `Gd`, to hold the base instance inside a user's `GodotClass`.
///
/// Behaves similarly to [`Gd`], but is more constrained. Cannot be constructed by the user.
pub struct Base<T: GodotClass> {
    // Never dropped, so it acts like a weak pointer: the engine object owns the user instance, not the other way round.
    obj: ManuallyDrop<Gd<T>>,
}

impl<T: GodotClass> Base<T> {
    /// # Safety
    /// `base_ptr` must be the engine object the user instance is attached to. The returned `Base` does not keep it
    /// alive and must not be accessed after the object is destroyed.
    pub(crate) unsafe fn from_sys(base_ptr: sys::GDExtensionObjectPtr) -> Self {
        assert!(!base_ptr.is_null(), "instance base is null pointer");

        Self {
            obj: ManuallyDrop::new(Gd::from_obj_sys_borrowed(base_ptr)),
        }
    }

    /// Returns a [`Gd`] referencing the same object as this reference.
    ///
    /// For reference-counted bases, this takes a new reference.
    #[doc(hidden)]
    pub fn to_gd(&self) -> Gd<T> {
        (*self.obj).clone()
    }

    /// Returns a borrowed [`Gd`] referencing the same object.
    #[doc(hidden)]
    pub fn as_gd(&self) -> &Gd<T> {
        &self.obj
    }
}

impl<T: GodotClass> Debug for Base<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Base {{ id: {} }}", self.obj.instance_id_unchecked())
    }
}

impl<T: GodotClass> Display for Base<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&*self.obj, f)
    }
}
