/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Storage of the Rust part of user-class instances, attached to their engine objects.

use std::any::{type_name, Any, TypeId};
use std::error::Error;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(not(feature = "experimental-threads"))]
use godot_cell::panicking::{GdCell, InaccessibleGuard, MutGuard, RefGuard};

#[cfg(feature = "experimental-threads")]
use godot_cell::blocking::{GdCell, InaccessibleGuard, MutGuard, RefGuard};

use gdbind_ffi as sys;

use crate::obj::{GdMut, GdRef, InstanceView};

/// Borrow guard of the instance cell, with the instance type erased.
pub(crate) type ErasedGuard<'a> = Box<dyn CellGuard + 'a>;

/// Marker for the guards of [`GdCell`]; they release their borrow on drop.
pub(crate) trait CellGuard {}

impl<T> CellGuard for RefGuard<'_, T> {}
impl<T> CellGuard for MutGuard<'_, T> {}
impl<T> CellGuard for InaccessibleGuard<'_, T> {}

type PartBorrow<'a> = Result<(ErasedGuard<'a>, Option<NonNull<dyn Any>>), Box<dyn Error>>;

/// Cell holding an instance of some user class, borrowed by the part (class or user-class ancestor) a caller needs.
trait InstanceCell {
    fn borrow_part(&self, part: TypeId) -> PartBorrow<'_>;

    fn borrow_part_mut(&self, part: TypeId) -> PartBorrow<'_>;

    /// # Safety
    /// `value` must come from an exclusive borrow of part `part` that is still live.
    unsafe fn make_inaccessible(
        &self,
        part: TypeId,
        value: NonNull<()>,
    ) -> Result<Option<ErasedGuard<'_>>, Box<dyn Error>>;

    fn is_bound(&self) -> bool;
}

impl<C: InstanceView> InstanceCell for GdCell<C> {
    fn borrow_part(&self, part: TypeId) -> PartBorrow<'_> {
        let guard = self.borrow()?;
        let view = guard.__view(part).map(NonNull::from);
        Ok((Box::new(guard), view))
    }

    fn borrow_part_mut(&self, part: TypeId) -> PartBorrow<'_> {
        let mut guard = self.borrow_mut()?;
        let view = guard.__view_mut(part).map(NonNull::from);
        Ok((Box::new(guard), view))
    }

    unsafe fn make_inaccessible(
        &self,
        part: TypeId,
        value: NonNull<()>,
    ) -> Result<Option<ErasedGuard<'_>>, Box<dyn Error>> {
        // Only the whole instance is known to the cell; ancestor parts are projections of it.
        if part != TypeId::of::<C>() {
            return Ok(None);
        }

        let instance = &mut *value.cast::<C>().as_ptr();
        let guard = GdCell::make_inaccessible(self, instance)?;
        Ok(Some(Box::new(guard)))
    }

    fn is_bound(&self) -> bool {
        self.is_currently_bound()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Instance of a user class, as seen by the engine (extension instance) and by handles (instance binding).
///
/// The instance is type-erased, so that virtual calls of a user-class ancestor can reach their own part of a derived
/// instance.
pub struct InstanceStorage {
    class_name: &'static str,
    base: sys::GDExtensionObjectPtr,
    cell: Box<dyn InstanceCell>,

    // References the engine holds, as reported by the reference/unreference callbacks.
    engine_refs: AtomicU32,
}

impl InstanceStorage {
    pub(crate) fn new<C: InstanceView>(
        class_name: &'static str,
        base: sys::GDExtensionObjectPtr,
        instance: C,
    ) -> Self {
        sys::out!("    Storage::new   <{class_name}>");

        Self {
            class_name,
            base,
            cell: Box::new(GdCell::new(instance)),
            engine_refs: AtomicU32::new(1),
        }
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Whether any guard (shared, exclusive or inaccessible) is currently live.
    pub(crate) fn is_bound(&self) -> bool {
        self.cell.is_bound()
    }

    /// Shared access to the part of type `T` (the class itself or one of its user-class ancestors).
    ///
    /// # Panics
    /// If the instance is exclusively bound, or has no part of type `T`.
    pub fn get<T: 'static>(&self) -> GdRef<'_, T> {
        let (guard, part) = self
            .cell
            .borrow_part(TypeId::of::<T>())
            .unwrap_or_else(|err| self.already_bound::<T>("bind", &*err));

        let value = self.checked_part::<T>(part);

        // SAFETY: value points into the instance borrowed by guard.
        unsafe { GdRef::from_guard(guard, value) }
    }

    /// Exclusive access to the part of type `T`.
    ///
    /// # Panics
    /// If the instance is already bound, or has no part of type `T`.
    pub fn get_mut<T: 'static>(&self) -> GdMut<'_, T> {
        let (guard, part) = self
            .cell
            .borrow_part_mut(TypeId::of::<T>())
            .unwrap_or_else(|err| self.already_bound::<T>("bind_mut", &*err));

        let value = self.checked_part::<T>(part);

        // SAFETY: value points into the instance exclusively borrowed by guard.
        unsafe { GdMut::from_guard(guard, value) }
    }

    /// Suspends the exclusive borrow that handed out `value`, until the returned guard is dropped.
    ///
    /// Returns `None` if `value` is the part of a user-class ancestor; such borrows stay in place.
    ///
    /// # Panics
    /// If `value` is not the live exclusive borrow of this instance.
    pub(crate) fn get_inaccessible<'a: 'b, 'b, T: 'static>(&'a self, value: &'b mut T) -> Option<ErasedGuard<'b>> {
        let ptr = NonNull::from(value).cast::<()>();

        // SAFETY: value is an exclusive borrow of part T, alive for 'b.
        match unsafe { self.cell.make_inaccessible(TypeId::of::<T>(), ptr) } {
            Ok(guard) => guard,
            Err(err) => panic!(
                "base_mut() failed on {} instance; the instance is not exclusively bound through `self`.\n  Details: {err}.",
                self.class_name
            ),
        }
    }

    pub(crate) fn on_inc_ref(&self) {
        let refs = self.engine_refs.fetch_add(1, Ordering::Relaxed) + 1;
        sys::out!("    Storage::on_inc_ref (rc={refs})   <{}> {:p}", self.class_name, self.base);
    }

    pub(crate) fn on_dec_ref(&self) {
        let refs = self.engine_refs.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        sys::out!("  | Storage::on_dec_ref (rc={refs})   <{}> {:p}", self.class_name, self.base);
    }

    /// Engine-side reference count last reported to the instance.
    pub fn engine_ref_count(&self) -> u32 {
        self.engine_refs.load(Ordering::Relaxed)
    }

    fn checked_part<T: 'static>(&self, part: Option<NonNull<dyn Any>>) -> NonNull<T> {
        match part {
            // SAFETY: the view was just handed out by a live borrow of the cell.
            Some(view) if unsafe { view.as_ref() }.is::<T>() => view.cast::<T>(),
            _ => self.no_such_view::<T>(),
        }
    }

    fn already_bound<T>(&self, method: &str, err: &dyn Error) -> ! {
        panic!(
            "\
                Gd::{method}() failed, already bound; class = {}, part = {}.\n  \
                Make sure to use `self.base_mut()` instead of `self.to_gd()` when possible.\n  \
                Details: {err}.\
            ",
            self.class_name,
            type_name::<T>()
        )
    }

    fn no_such_view<T>(&self) -> ! {
        panic!("instance of {} has no part of type {}", self.class_name, type_name::<T>())
    }
}

impl Drop for InstanceStorage {
    fn drop(&mut self) {
        sys::out!("    Storage::drop  <{}> {:p}", self.class_name, self.base);
    }
}

/// Interprets an extension instance pointer handed out by the engine.
///
/// # Safety
/// `instance_ptr` must come from a `create` callback of this library and the instance must not be freed yet.
pub(crate) unsafe fn as_storage<'u>(instance_ptr: sys::GDExtensionClassInstancePtr) -> &'u InstanceStorage {
    &*(instance_ptr as *const InstanceStorage)
}
