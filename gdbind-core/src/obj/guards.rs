/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::any::type_name;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use gdbind_ffi as sys;

use crate::obj::{Gd, WithBaseField};
use crate::storage::ErasedGuard;

/// Immutably/shared bound reference guard for a [`Gd`][crate::obj::Gd] smart pointer.
///
/// See [`Gd::bind`][crate::obj::Gd::bind] for usage.
pub struct GdRef<'a, T: 'static> {
    // Points into the instance kept borrowed by `_guard`.
    value: NonNull<T>,
    _guard: ErasedGuard<'a>,
}

impl<'a, T: 'static> GdRef<'a, T> {
    /// Holds `guard` and exposes the part `value` of the borrowed instance.
    ///
    /// # Safety
    /// `value` must point into the instance borrowed by `guard`.
    pub(crate) unsafe fn from_guard(guard: ErasedGuard<'a>, value: NonNull<T>) -> Self {
        Self { value, _guard: guard }
    }
}

impl<T: 'static> Deref for GdRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard keeps the instance borrowed and alive for the lifetime of self.
        unsafe { self.value.as_ref() }
    }
}

impl<T: 'static> Drop for GdRef<'_, T> {
    fn drop(&mut self) {
        sys::out!("GdRef drop: {:?}", type_name::<T>());
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Mutably/exclusively bound reference guard for a [`Gd`][crate::obj::Gd] smart pointer.
///
/// See [`Gd::bind_mut`][crate::obj::Gd::bind_mut] for usage.
pub struct GdMut<'a, T: 'static> {
    value: NonNull<T>,
    _guard: ErasedGuard<'a>,
}

impl<'a, T: 'static> GdMut<'a, T> {
    /// # Safety
    /// `value` must point into the instance exclusively borrowed by `guard`.
    pub(crate) unsafe fn from_guard(guard: ErasedGuard<'a>, value: NonNull<T>) -> Self {
        Self { value, _guard: guard }
    }
}

impl<T: 'static> Deref for GdMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: see GdRef.
        unsafe { self.value.as_ref() }
    }
}

impl<T: 'static> DerefMut for GdMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: exclusive borrow held by the guard.
        unsafe { self.value.as_mut() }
    }
}

impl<T: 'static> Drop for GdMut<'_, T> {
    fn drop(&mut self) {
        sys::out!("GdMut drop: {:?}", type_name::<T>());
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Exclusive guard for the base object of a user instance, obtained from
/// [`WithBaseField::base_mut()`][crate::obj::WithBaseField::base_mut].
///
/// While it lives, the `&mut self` it was created from is suspended, so the engine may call back into the instance.
pub struct BaseMut<'a, T: WithBaseField> {
    gd: Gd<T::NativeBase>,
    _inaccessible_guard: Option<ErasedGuard<'a>>,
}

impl<'a, T: WithBaseField> BaseMut<'a, T> {
    pub(crate) fn new(gd: Gd<T::NativeBase>, inaccessible_guard: Option<ErasedGuard<'a>>) -> Self {
        Self {
            gd,
            _inaccessible_guard: inaccessible_guard,
        }
    }
}

impl<T: WithBaseField> Deref for BaseMut<'_, T> {
    type Target = Gd<T::NativeBase>;

    fn deref(&self) -> &Gd<T::NativeBase> {
        &self.gd
    }
}

impl<T: WithBaseField> DerefMut for BaseMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Gd<T::NativeBase> {
        &mut self.gd
    }
}
