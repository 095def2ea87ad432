/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr;

use gdbind_ffi as sys;
use sys::{interface_fn, Global, ReturnOwnership};

use crate::builtin::StringName;
use crate::classes::{ref_counted, Object};
use crate::handle::{HandleKind, HandleState, Ownership};
use crate::obj::{EngineClass, GdMut, GdRef, GodotClass, Inherits, InstanceId, Memory, UserClass};
use crate::storage::InstanceStorage;

/// Smart pointer to objects owned by the engine.
///
/// This smart pointer can only hold _objects_ in the engine's sense: instances of engine classes (`Node`,
/// `RefCounted`, etc.) or user-declared structs (declared with `#[derive(GodotClass)]`). It does **not** hold built-in
/// types (`Vector3`, `Color`, `i64`).
///
/// `Gd<T>` never holds null objects. If you need nullability, use `Option<Gd<T>>`.
///
/// # Memory management
///
/// Every handle carries an [`Ownership`]:
///
/// - **Owned**<br>
///   For reference-counted classes, the handle holds one reference and releases it on drop; the last reference destroys
///   the object. For manually managed classes, the handle is responsible for calling [`free()`][Self::free]; dropping
///   it without freeing leaks the object (and the handle audit reports it).<br><br>
///
/// - **Borrowed**<br>
///   The engine or another handle owns the object. Dropping does nothing; `free()` panics.<br><br>
///
/// - **BoundTo(parent)**<br>
///   The object lives as long as its parent object, e.g. a child node returned by its parent. Dropping does nothing;
///   `free()` panics.
///
/// Cloning a reference-counted handle takes a new reference and is owned. Cloning a manually managed handle yields a
/// borrowed handle, so that exactly one handle can free the object.
///
/// # Construction
///
/// | Memory strategy | Engine type          | User type            |
/// |-----------------|----------------------|----------------------|
/// | Ref-counted     | `RefCounted::new_gd()` | `MyClass::new_gd()`  |
/// | Manual          | `Node::new_alloc()`  | `MyClass::new_alloc()` |
///
/// # Accessing the object
///
/// For engine classes, `Gd<T>` dereferences to the class façade, e.g. `node.set_name("x")`. For user classes, use
/// [`bind()`][Self::bind] and [`bind_mut()`][Self::bind_mut], and [`upcast_ref()`][Self::upcast_ref] for engine
/// methods.
#[repr(C)]
pub struct Gd<T: GodotClass> {
    // Must stay the first field: engine-class façades are reinterpreted from its address (see Deref).
    raw: sys::GDExtensionObjectPtr,
    instance_id: InstanceId,
    state: HandleState,
    _marker: PhantomData<*const T>,
}

impl<T: GodotClass> Gd<T> {
    /// Wraps an object the caller transfers to the handle: a reference (ref-counted) or the duty to free (manual).
    ///
    /// # Safety
    /// `raw` must be a live object of class `T` or a subclass.
    #[doc(hidden)]
    pub unsafe fn from_obj_sys_owned(raw: sys::GDExtensionObjectPtr) -> Self {
        Self::from_obj_sys_with(raw, Ownership::Owned)
    }

    /// Wraps an object without taking responsibility for it.
    ///
    /// # Safety
    /// `raw` must be a live object of class `T` or a subclass, which outlives the handle.
    #[doc(hidden)]
    pub unsafe fn from_obj_sys_borrowed(raw: sys::GDExtensionObjectPtr) -> Self {
        Self::from_obj_sys_with(raw, Ownership::Borrowed)
    }

    /// Wraps an object whose lifetime is bound to the parent object `parent`.
    ///
    /// # Safety
    /// `raw` must be a live object of class `T` or a subclass.
    #[doc(hidden)]
    pub unsafe fn from_obj_sys_bound(parent: InstanceId, raw: sys::GDExtensionObjectPtr) -> Self {
        Self::from_obj_sys_with(raw, Ownership::BoundTo(parent))
    }

    /// # Safety
    /// `raw` must be a live object of class `T` or a subclass.
    ///
    /// # Panics
    /// If `raw` is null.
    #[doc(hidden)]
    pub unsafe fn from_obj_sys_with(raw: sys::GDExtensionObjectPtr, ownership: Ownership) -> Self {
        assert!(!raw.is_null(), "Gd<{}> constructed from null object pointer", T::CLASS_NAME);

        let instance_id = InstanceId::of_object(raw)
            .unwrap_or_else(|| panic!("Gd<{}>: object has no instance ID", T::CLASS_NAME));

        Self {
            raw,
            instance_id,
            state: HandleState::with(HandleKind::Object, ownership),
            _marker: PhantomData,
        }
    }

    /// Instantiates `T` through the engine's class database.
    pub(crate) fn construct() -> Self {
        let class_name = StringName::from(T::CLASS_NAME);

        // SAFETY: construction by registered class name; returns null for unknown classes.
        let raw = unsafe { interface_fn!(classdb_construct_object)(class_name.sys()) };
        assert!(!raw.is_null(), "failed to construct object of class {}", T::CLASS_NAME);

        // SAFETY: freshly created object of class T.
        let gd = unsafe { Self::from_obj_sys_owned(raw) };
        if gd.is_ref_counted() {
            // SAFETY: fresh reference-counted object; its first reference is taken by this handle.
            unsafe { ref_counted::raw_init_ref(raw) };
        }

        sys::out!("Gd<{}>::construct -> {}", T::CLASS_NAME, gd.instance_id);
        gd
    }

    /// Looks up a live object by its instance ID.
    ///
    /// Returns `None` if the object was destroyed or is not a `T`.
    pub fn try_from_instance_id(instance_id: InstanceId) -> Option<Self> {
        // SAFETY: querying an ID is allowed for any value.
        let raw = unsafe { interface_fn!(object_get_instance_from_id)(instance_id.to_u64()) };
        if raw.is_null() {
            return None;
        }

        // SAFETY: live object; clone() takes a reference or yields a borrowed handle.
        let object = unsafe { Gd::<Object>::from_obj_sys_borrowed(raw) };
        object.clone().try_cast::<T>().ok()
    }

    /// ⚠️ Returns the instance ID of this object (panics when the object has been freed).
    pub fn instance_id(&self) -> InstanceId {
        assert!(
            self.is_instance_valid(),
            "Gd<{}>::instance_id() called on freed object {}",
            T::CLASS_NAME,
            self.instance_id
        );
        self.instance_id
    }

    /// Returns the last known instance ID, without checking validity.
    pub fn instance_id_unchecked(&self) -> InstanceId {
        self.instance_id
    }

    /// Checks if this smart pointer points to a live object (read description!).
    ///
    /// Using this method is often indicative of bad design -- you should dispose of your pointers once an object is
    /// destroyed. However, this method exists because GDScript offers it and there may be rare use cases.
    pub fn is_instance_valid(&self) -> bool {
        self.instance_id.lookup_validity()
    }

    /// Ownership state of this handle.
    pub fn ownership(&self) -> Ownership {
        self.state.ownership()
    }

    /// Runtime class name of the object; may be a subclass of `T`.
    pub fn dynamic_class_name(&self) -> String {
        let mut known = sys::conv::SYS_FALSE;

        // SAFETY: the engine initializes the name; a zeroed name is the empty name if it does not.
        let name = unsafe {
            StringName::new_with_uninit(|dest| {
                known = interface_fn!(object_get_class_name)(self.raw, sys::get_library(), dest);
            })
        };

        if sys::conv::bool_from_sys(known) {
            name.to_rust_string()
        } else {
            T::CLASS_NAME.to_string()
        }
    }

    /// **Upcast:** convert into a smart pointer to a base class. Always succeeds.
    pub fn upcast<Base>(self) -> Gd<Base>
    where
        Base: GodotClass,
        T: Inherits<Base>,
    {
        // SAFETY: Inherits guarantees the object is a Base.
        unsafe { self.cast_unchecked() }
    }

    /// **Upcast shared-ref:** access this object as a shared reference to a base class façade.
    pub fn upcast_ref<Base>(&self) -> &Base
    where
        Base: EngineClass,
        T: Inherits<Base>,
    {
        // SAFETY: the façade is layout-compatible with the object pointer field, and Inherits guarantees the class.
        unsafe { &*(ptr::addr_of!(self.raw) as *const Base) }
    }

    /// **Upcast exclusive-ref:** access this object as an exclusive reference to a base class façade.
    pub fn upcast_mut<Base>(&mut self) -> &mut Base
    where
        Base: EngineClass,
        T: Inherits<Base>,
    {
        // SAFETY: see upcast_ref().
        unsafe { &mut *(ptr::addr_of_mut!(self.raw) as *mut Base) }
    }

    /// **Downcast:** try to convert into a smart pointer to a derived class.
    ///
    /// If `T`'s dynamic type is not `Derived` or one of its subclasses, `Err(self)` is returned, meaning you can reuse
    /// the original object for further casts.
    pub fn try_cast<Derived>(self) -> Result<Gd<Derived>, Self>
    where
        Derived: GodotClass,
    {
        let tag = class_tag(Derived::CLASS_NAME);

        // SAFETY: live object, tag from the class database (null for unknown classes, which fails the cast).
        let casted = unsafe { interface_fn!(object_cast_to)(self.raw, tag) };
        if casted.is_null() {
            Err(self)
        } else {
            // SAFETY: the engine confirmed the object is a Derived.
            Ok(unsafe { self.cast_unchecked() })
        }
    }

    /// ⚠️ **Downcast:** convert into a smart pointer to a derived class. Panics on error.
    pub fn cast<Derived>(self) -> Gd<Derived>
    where
        Derived: GodotClass,
    {
        self.try_cast().unwrap_or_else(|original| {
            panic!(
                "downcast from {from} to {to} failed; instance {original:?}",
                from = T::CLASS_NAME,
                to = Derived::CLASS_NAME,
            )
        })
    }

    /// Moves the handle, including its ownership, to another static type.
    ///
    /// # Safety
    /// The object must be an instance of `U` or a subclass.
    pub(crate) unsafe fn cast_unchecked<U: GodotClass>(self) -> Gd<U> {
        let this = ManuallyDrop::new(self);

        Gd {
            raw: this.raw,
            instance_id: this.instance_id,
            state: ptr::read(&this.state),
            _marker: PhantomData,
        }
    }

    /// ⚠️ Destroys the manually-managed engine object.
    ///
    /// # Panics
    /// - If the class is reference-counted. Those are destroyed when their last reference is dropped.
    /// - If the handle is not [`Owned`](Ownership::Owned). Borrowed and bound handles must not free.
    /// - If the object was already destroyed.
    pub fn free(self) {
        if self.is_ref_counted() {
            panic!(
                "free() forbidden on reference-counted Gd<{}>; drop the last reference instead",
                T::CLASS_NAME
            );
        }

        let ownership = self.ownership();
        if !ownership.is_owned() {
            panic!(
                "free() forbidden on {ownership} Gd<{}>; only the owning handle may free the object",
                T::CLASS_NAME
            );
        }

        assert!(
            self.is_instance_valid(),
            "called free() on already destroyed object {}",
            self.instance_id
        );

        let mut this = ManuallyDrop::new(self);
        this.state.release();
        sys::out!("Gd<{}>::free {}", T::CLASS_NAME, this.instance_id);

        // SAFETY: owned, live, manually managed object.
        unsafe { interface_fn!(object_destroy)(this.raw) };
    }

    /// Gives up this handle's ownership without releasing the object, e.g. when passing it to the engine.
    pub(crate) fn forget_ownership(self) {
        let mut this = ManuallyDrop::new(self);
        this.state.release();
    }

    #[doc(hidden)]
    pub fn obj_sys(&self) -> sys::GDExtensionObjectPtr {
        self.raw
    }

    fn is_ref_counted(&self) -> bool {
        <T::Memory as Memory>::IS_REF_COUNTED.unwrap_or_else(|| is_ref_counted_object(self.raw))
    }
}

impl<T: UserClass> Gd<T> {
    /// Hands out a guard for a shared borrow, through which the user instance can be read.
    ///
    /// # Panics
    /// If the instance is currently bound (by Rust or by an engine callback running on it).
    pub fn bind(&self) -> GdRef<'_, T> {
        self.storage().get::<T>()
    }

    /// Hands out a guard for an exclusive borrow, through which the user instance can be read and written.
    ///
    /// # Panics
    /// If the instance is currently bound (by Rust or by an engine callback running on it).
    pub fn bind_mut(&mut self) -> GdMut<'_, T> {
        self.storage().get_mut::<T>()
    }

    /// Number of references the engine holds on the instance, as reported through the reference callbacks.
    #[doc(hidden)]
    pub fn __engine_ref_count(&self) -> u32 {
        self.storage().engine_ref_count()
    }

    fn storage(&self) -> &InstanceStorage {
        // SAFETY: the storage lives as long as the object, which self keeps alive (or is documented to be alive).
        unsafe { self.storage_unbounded() }
    }

    /// Storage of the instance, with a lifetime not tied to `self`.
    ///
    /// # Safety
    /// The object must stay alive for `'b`.
    pub(crate) unsafe fn storage_unbounded<'b>(&self) -> &'b InstanceStorage {
        // SAFETY: the binding was set in the create callback of the extension class and lives as long as the object.
        unsafe {
            let binding = interface_fn!(object_get_instance_binding)(
                self.raw,
                sys::binding_token(),
                &sys::EMPTY_BINDING_CALLBACKS,
            );

            assert!(
                !binding.is_null(),
                "Gd<{}>: object {} has no Rust instance storage (destroyed, or not created by this library)",
                T::CLASS_NAME,
                self.instance_id
            );

            &*(binding as *const InstanceStorage)
        }
    }
}

impl<T: EngineClass> Deref for Gd<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: EngineClass guarantees T is a #[repr(C)] wrapper of exactly one object pointer.
        unsafe { &*(ptr::addr_of!(self.raw) as *const T) }
    }
}

impl<T: EngineClass> DerefMut for Gd<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: see Deref.
        unsafe { &mut *(ptr::addr_of_mut!(self.raw) as *mut T) }
    }
}

impl<T: GodotClass> Clone for Gd<T> {
    fn clone(&self) -> Self {
        if self.is_ref_counted() {
            // SAFETY: live ref-counted object; the new handle owns the reference taken here.
            unsafe {
                ref_counted::raw_reference(self.raw);
                Self::from_obj_sys_owned(self.raw)
            }
        } else {
            // SAFETY: live object; only the original handle may free it.
            unsafe { Self::from_obj_sys_borrowed(self.raw) }
        }
    }
}

impl<T: GodotClass> Drop for Gd<T> {
    fn drop(&mut self) {
        if !self.state.is_owned() {
            return;
        }

        if !self.is_ref_counted() {
            // Manual objects are only destroyed through free(); the audit keeps this handle live.
            sys::out!("Gd<{}> {} dropped without free()", T::CLASS_NAME, self.instance_id);
            return;
        }

        self.state.release();

        // SAFETY: the handle owned one reference to a live object.
        unsafe {
            if ref_counted::raw_unreference(self.raw) {
                sys::out!("Gd<{}> {}: last reference released, destroying", T::CLASS_NAME, self.instance_id);
                interface_fn!(object_destroy)(self.raw);
            }
        }
    }
}

impl<T: GodotClass> PartialEq for Gd<T> {
    /// Objects are equal if their instance IDs are equal.
    fn eq(&self, other: &Self) -> bool {
        self.instance_id == other.instance_id
    }
}

impl<T: GodotClass> Eq for Gd<T> {}

impl<T: GodotClass> Display for Gd<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}#{}", T::CLASS_NAME, self.instance_id)
    }
}

impl<T: GodotClass> Debug for Gd<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Gd<{}> {{ id: {}, {} }}",
            T::CLASS_NAME,
            self.instance_id,
            self.state.ownership()
        )
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Frame marshaling

impl<T: GodotClass> sys::FrameRetObject for Gd<T> {
    unsafe fn from_ret_object(raw: sys::GDExtensionObjectPtr, meta: &sys::ReturnMeta) -> Self {
        match meta.ownership {
            ReturnOwnership::Owned => Self::from_obj_sys_owned(raw),
            ReturnOwnership::Borrowed => Self::from_obj_sys_borrowed(raw),
            ReturnOwnership::BoundToReceiver => match InstanceId::of_object(meta.receiver) {
                Some(parent) => Self::from_obj_sys_bound(parent, raw),
                None => Self::from_obj_sys_borrowed(raw),
            },
        }
    }
}

impl<T: GodotClass> sys::FrameArgObject for Gd<T> {
    fn arg_object_ptr(&self) -> sys::GDExtensionObjectPtr {
        self.raw
    }
}

/// Objects are passed as pointer to the object pointer.
impl<'a, T: GodotClass> sys::FrameArg<'a> for &'a Gd<T> {
    fn write_arg(self, frame: &mut sys::CallFrame<'a>) {
        frame.push_inline(self.raw);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Runtime type information

/// Class tags are stable for the process lifetime; cache them by name. Stored as address to stay `Send`.
static CLASS_TAGS: Global<HashMap<&'static str, usize>> = Global::default();

/// Engine tag of a class, for `object_cast_to`. Null for unknown classes.
pub(crate) fn class_tag(class_name: &'static str) -> *mut c_void {
    if let Some(tag) = CLASS_TAGS.lock().get(class_name) {
        return *tag as *mut c_void;
    }

    let name = StringName::from(class_name);
    // SAFETY: lookup by valid class name.
    let tag = unsafe { interface_fn!(classdb_get_class_tag)(name.sys()) };
    if !tag.is_null() {
        CLASS_TAGS.lock().insert(class_name, tag as usize);
    }

    tag
}

/// Whether a live object derives from `RefCounted`.
pub(crate) fn is_ref_counted_object(raw: sys::GDExtensionObjectPtr) -> bool {
    let tag = class_tag(<crate::classes::RefCounted as GodotClass>::CLASS_NAME);

    // SAFETY: live object.
    !unsafe { interface_fn!(object_cast_to)(raw, tag) }.is_null()
}
