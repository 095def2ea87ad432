/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::any::{Any, TypeId};

use gdbind_ffi as sys;
use sys::InitLevel;

use crate::obj::{Base, BaseMut, Gd};

/// Makes `T` eligible to be managed by the engine and stored in [`Gd<T>`][crate::obj::Gd] pointers.
///
/// Implemented by the hand-written engine classes in [`classes`](crate::classes) and by
/// `#[derive(GodotClass)]` for user classes.
pub trait GodotClass: Sized + 'static {
    /// The immediate superclass of `T`. This is always an engine class or user class, except for `Object`.
    type Base: GodotClass;

    /// Whether instances are reference-counted, manually managed, or decided at runtime.
    type Memory: Memory;

    /// The name of the class, under which it is registered in the engine.
    const CLASS_NAME: &'static str;

    /// Initialization level, during which this class should be initialized with the engine.
    const INIT_LEVEL: InitLevel;

    /// Returns the class name, as registered with the engine.
    fn class_name() -> &'static str {
        Self::CLASS_NAME
    }

    /// Returns whether `Self` inherits from `U`, by walking the registered class hierarchy.
    ///
    /// # Panics
    /// If the class registry is not initialized yet.
    fn inherits<U: GodotClass>() -> bool {
        crate::registry::ClassDb::get().is_subclass_of(Self::CLASS_NAME, U::CLASS_NAME)
    }
}

/// Type representing the absence of a base class, at the root of the hierarchy.
///
/// `NoBase` is used as the base class for exactly one class: `Object`.
pub enum NoBase {}

impl GodotClass for NoBase {
    type Base = NoBase;
    type Memory = MemManual;

    const CLASS_NAME: &'static str = "(no base)";
    const INIT_LEVEL: InitLevel = InitLevel::Core;
}

/// Engine class whose façade can be reached through `Deref` on [`Gd<T>`].
///
/// # Safety
/// The implementing type must be `#[repr(C)]` with a single `object_ptr: sys::GDExtensionObjectPtr` field, so that
/// the address of a `Gd<T>`'s object pointer is a valid `&T`.
pub unsafe trait EngineClass: GodotClass {
    /// Object pointer the façade operates on.
    fn obj_sys(&self) -> sys::GDExtensionObjectPtr;
}

/// Engine classes that can be instantiated with [`new_alloc()`](NewAlloc::new_alloc) or
/// [`new_gd()`](NewGd::new_gd).
///
/// Classes without public constructor in the engine (abstract classes) don't implement it.
pub trait Constructible: GodotClass {}

/// Marks a class as inheriting from `Base`, either directly or transitively.
///
/// Enables [`Gd::upcast()`] and friends.
///
/// # Safety
/// This trait must only be implemented for subclasses of `Base`.
///
/// Importantly, this means it is always safe to upcast a value of type `Gd<Self>` to `Gd<Base>`.
pub unsafe trait Inherits<Base: GodotClass>: GodotClass {}

// SAFETY: Every class is a subclass of itself.
unsafe impl<T: GodotClass> Inherits<T> for T {}

/// Class implemented in Rust, with instance storage attached to an engine base object.
///
/// Generated by `#[derive(GodotClass)]`.
pub trait UserClass: GodotClass + InstanceView {
    /// Nearest engine class in the inheritance chain; this is what the engine instantiates.
    type NativeBase: EngineClass;

    /// Creates the Rust part of a new instance.
    #[doc(hidden)]
    fn __init(base: Base<Self::NativeBase>) -> Self;
}

/// Hand-written constructor of a user class, for classes without `#[class(init)]`.
pub trait UserInit: UserClass {
    /// Creates the Rust part of a new instance around its engine object.
    fn init(base: Base<Self::NativeBase>) -> Self;
}

/// Type-erased access to a user instance and to the parts contributed by its user-class ancestors.
///
/// Generated by `#[derive(GodotClass)]`. The chain follows `#[parent]` fields: a `C` that embeds a `B` which embeds an
/// `A` can be viewed as any of the three.
pub trait InstanceView: Any {
    #[doc(hidden)]
    fn __view(&self, type_id: TypeId) -> Option<&dyn Any>;

    #[doc(hidden)]
    fn __view_mut(&mut self, type_id: TypeId) -> Option<&mut dyn Any>;
}

/// Virtual switch of a user class, mapping engine virtual names (`"_ready"`) to trampolines.
///
/// Generated by `#[godot_api]` on the class's interface-trait impl. Names the impl does not override yield `None`, so
/// that lookup continues with the base class.
pub trait ImplementsVirtuals: UserClass {
    #[doc(hidden)]
    fn __virtual_call(name: &str) -> sys::GDExtensionClassCallVirtual;
}

/// Trait that is automatically implemented for user classes containing a `Base<T>` field (directly or through a
/// `#[parent]` field).
///
/// Gives direct access to the containing `Gd<Self>` from `self`.
pub trait WithBaseField: UserClass {
    /// Returns the `Base<T>` field of `self`.
    #[doc(hidden)]
    fn base_field(&self) -> &Base<Self::NativeBase>;

    /// Returns the engine object as a handle of the native base class.
    fn base(&self) -> Gd<Self::NativeBase> {
        self.base_field().to_gd()
    }

    /// Returns a `Gd` pointing to this instance.
    ///
    /// Must not be called while `self` is already bound mutably from the engine side and bound again (re-entrant).
    fn to_gd(&self) -> Gd<Self> {
        let base = self.base_field().to_gd();

        // SAFETY: the base object's extension instance is `Self` (or a subclass that embeds it).
        unsafe { base.cast_unchecked::<Self>() }
    }

    /// Returns an exclusive guard for the base object, through which the engine may call back into this instance.
    ///
    /// Unlike [`to_gd()`](Self::to_gd), which hands out a handle whose `bind()` fails while `self` is bound, the guard
    /// suspends the `&mut self` borrow until it is dropped. Engine callbacks (virtual calls, `#[func]` calls, property
    /// access) running in the meantime may bind the instance again.
    ///
    /// Only the most derived class of the instance can suspend its borrow. Called on the part of a user-class ancestor,
    /// the guard still gives access to the base object, but the instance remains bound.
    fn base_mut(&mut self) -> BaseMut<'_, Self> {
        let base = self.base_field().to_gd();
        let gd = self.to_gd();

        // SAFETY: self lives in the storage of gd's object, so the storage outlives the borrow of self.
        let storage = unsafe { gd.storage_unbounded() };
        let guard = storage.get_inaccessible(self);

        BaseMut::new(base, guard)
    }
}

/// Automatic object construction for reference-counted classes.
pub trait NewGd: GodotClass {
    /// Instantiates a new object, returning an owned reference.
    fn new_gd() -> Gd<Self>;
}

/// Automatic object construction for manually managed classes.
pub trait NewAlloc: GodotClass {
    /// Instantiates a new object, returning an owned handle that must be [`free()`](Gd::free)d.
    #[must_use]
    fn new_alloc() -> Gd<Self>;
}

impl<T> NewGd for T
where
    T: Constructible<Memory = MemRefCounted>,
{
    fn new_gd() -> Gd<Self> {
        Gd::construct()
    }
}

impl<T> NewAlloc for T
where
    T: Constructible<Memory = MemManual>,
{
    fn new_alloc() -> Gd<Self> {
        Gd::construct()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Memory strategies

/// Memory strategy of a class.
pub trait Memory: 'static {
    /// `Some(true)` for reference-counted, `Some(false)` for manually managed, `None` if it depends on the instance.
    #[doc(hidden)]
    const IS_REF_COUNTED: Option<bool>;
}

/// Reference-counted: `RefCounted` and all its subclasses.
pub enum MemRefCounted {}

/// Manually managed: everything not deriving from `RefCounted`, e.g. `Node`.
pub enum MemManual {}

/// Decided per instance: `Object`, whose handles may point to either kind.
pub enum MemDynamic {}

impl Memory for MemRefCounted {
    const IS_REF_COUNTED: Option<bool> = Some(true);
}

impl Memory for MemManual {
    const IS_REF_COUNTED: Option<bool> = Some(false);
}

impl Memory for MemDynamic {
    const IS_REF_COUNTED: Option<bool> = None;
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Capabilities

/// Capability traits, implemented by `#[godot_api]` for the engine callbacks a class overrides.
///
/// Each one is backed by a method of the class's interface trait (`on_notification()`, `get_property()`, ...).
pub mod cap {
    use super::*;
    use crate::builtin::{StringName, Variant};
    use crate::meta::PropertyInfo;

    #[doc(hidden)]
    pub trait GodotNotification: GodotClass {
        #[doc(hidden)]
        fn __godot_notification(&mut self, what: i32);
    }

    #[doc(hidden)]
    pub trait GodotGet: GodotClass {
        #[doc(hidden)]
        fn __godot_get_property(&self, property: StringName) -> Option<Variant>;
    }

    #[doc(hidden)]
    pub trait GodotSet: GodotClass {
        #[doc(hidden)]
        fn __godot_set_property(&mut self, property: StringName, value: Variant) -> bool;
    }

    #[doc(hidden)]
    pub trait GodotGetPropertyList: GodotClass {
        #[doc(hidden)]
        fn __godot_get_property_list(&mut self) -> Vec<PropertyInfo>;
    }

    #[doc(hidden)]
    pub trait GodotPropertyGetRevert: GodotClass {
        #[doc(hidden)]
        fn __godot_property_get_revert(&self, property: StringName) -> Option<Variant>;
    }

    /// Methods of the class's inherent `#[godot_api]` impl, exposed to the engine with `#[func]`.
    #[doc(hidden)]
    pub trait ImplementsGodotApi: GodotClass {
        #[doc(hidden)]
        fn __register_methods();
    }
}
