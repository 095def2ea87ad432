/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::any::TypeId;
use std::fmt;

use gdbind_ffi as sys;
use sys::InitLevel;

use crate::obj::{cap, GodotClass, UserClass};
use crate::registry::callbacks;
use crate::registry::class_db::{factory, parent_name, ErasedFactoryFn};

/// Virtual switch of one class: maps an engine virtual name (e.g. `"_ready"`) to its trampoline.
pub type ErasedVirtualFn = fn(&str) -> sys::GDExtensionClassCallVirtual;

/// Piece of information that is gathered by the self-registration ("plugin") system.
///
/// You should not manually construct this struct, but rather use [`ClassPlugin::new()`].
#[derive(Debug)]
pub struct ClassPlugin {
    /// The name of the class the item belongs to.
    pub(crate) class_name: &'static str,

    /// Which [`InitLevel`] this plugin should be registered at.
    pub(crate) init_level: InitLevel,

    /// The actual item being registered.
    pub(crate) item: PluginItem,
}

impl ClassPlugin {
    /// Creates a new `ClassPlugin`, taking `class_name` and `init_level` from [`GodotClass`].
    pub fn new<T: GodotClass>(item: PluginItem) -> Self {
        Self {
            class_name: T::CLASS_NAME,
            init_level: T::INIT_LEVEL,
            item,
        }
    }
}

/// Represents the data part of a [`ClassPlugin`] instance.
///
/// Each enumerator represents a different item in Rust code, which is processed by an independent proc macro.
#[derive(Clone)]
pub enum PluginItem {
    /// Class definition itself, must always be available -- created by `#[derive(GodotClass)]`.
    Struct(StructInfo),

    /// `#[func]` methods -- created by `#[godot_api]` on `impl MyClass`.
    InherentImpl(InherentImpl),

    /// Virtual methods and object callbacks of an interface-trait impl -- created by `#[godot_api]` on
    /// `impl I... for MyClass`.
    ITraitImpl(ITraitImpl),
}

impl fmt::Debug for PluginItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Struct(info) => f.debug_tuple("Struct").field(info).finish(),
            Self::InherentImpl(_) => f.write_str("InherentImpl"),
            Self::ITraitImpl(info) => f.debug_tuple("ITraitImpl").field(&info.callbacks).finish(),
        }
    }
}

#[derive(Clone, Copy)]
pub struct InherentImpl {
    /// Registers the methods with the engine, after the class itself.
    pub(crate) register_methods_fn: fn(),
}

impl InherentImpl {
    pub fn of<T: cap::ImplementsGodotApi>() -> Self {
        Self {
            register_methods_fn: T::__register_methods,
        }
    }
}

/// Object callbacks a user class may override. Absent ones are inherited from user-class bases, if any.
#[derive(Clone, Copy, Default)]
pub struct ClassCallbacks {
    pub(crate) notification_fn: sys::GDExtensionClassNotification,
    pub(crate) get_property_fn: sys::GDExtensionClassGet,
    pub(crate) set_property_fn: sys::GDExtensionClassSet,
    pub(crate) get_property_list_fn: sys::GDExtensionClassGetPropertyList,
    pub(crate) free_property_list_fn: sys::GDExtensionClassFreePropertyList,
    pub(crate) property_can_revert_fn: sys::GDExtensionClassPropertyCanRevert,
    pub(crate) property_get_revert_fn: sys::GDExtensionClassPropertyGetRevert,
}

impl ClassCallbacks {
    /// Fills each callback missing in `self` from `base`.
    pub(crate) fn or(self, base: &ClassCallbacks) -> Self {
        Self {
            notification_fn: self.notification_fn.or(base.notification_fn),
            get_property_fn: self.get_property_fn.or(base.get_property_fn),
            set_property_fn: self.set_property_fn.or(base.set_property_fn),
            get_property_list_fn: self.get_property_list_fn.or(base.get_property_list_fn),
            free_property_list_fn: self.free_property_list_fn.or(base.free_property_list_fn),
            property_can_revert_fn: self.property_can_revert_fn.or(base.property_can_revert_fn),
            property_get_revert_fn: self.property_get_revert_fn.or(base.property_get_revert_fn),
        }
    }
}

impl fmt::Debug for ClassCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCallbacks")
            .field("notification", &self.notification_fn.is_some())
            .field("get_property", &self.get_property_fn.is_some())
            .field("set_property", &self.set_property_fn.is_some())
            .field("get_property_list", &self.get_property_list_fn.is_some())
            .field("property_get_revert", &self.property_get_revert_fn.is_some())
            .finish()
    }
}

/// Interface-trait impl of a user class.
///
/// ```ignore
/// ITraitImpl::new(<MyClass as ImplementsVirtuals>::__virtual_call)
///     .with_on_notification::<MyClass>()
///     .with_get_property::<MyClass>()
/// ```
#[derive(Clone, Copy)]
pub struct ITraitImpl {
    pub(crate) get_virtual_fn: ErasedVirtualFn,
    pub(crate) callbacks: ClassCallbacks,
}

impl ITraitImpl {
    pub fn new(get_virtual_fn: ErasedVirtualFn) -> Self {
        Self {
            get_virtual_fn,
            callbacks: ClassCallbacks::default(),
        }
    }

    pub fn with_on_notification<T: cap::GodotNotification>(mut self) -> Self {
        self.callbacks.notification_fn = Some(callbacks::on_notification::<T>);
        self
    }

    pub fn with_get_property<T: cap::GodotGet>(mut self) -> Self {
        self.callbacks.get_property_fn = Some(callbacks::get_property::<T>);
        self
    }

    pub fn with_set_property<T: cap::GodotSet>(mut self) -> Self {
        self.callbacks.set_property_fn = Some(callbacks::set_property::<T>);
        self
    }

    pub fn with_get_property_list<T: cap::GodotGetPropertyList>(mut self) -> Self {
        self.callbacks.get_property_list_fn = Some(callbacks::get_property_list::<T>);
        self.callbacks.free_property_list_fn = Some(callbacks::free_property_list);
        self
    }

    pub fn with_property_get_revert<T: cap::GodotPropertyGetRevert>(mut self) -> Self {
        self.callbacks.property_can_revert_fn = Some(callbacks::property_can_revert::<T>);
        self.callbacks.property_get_revert_fn = Some(callbacks::property_get_revert::<T>);
        self
    }
}

/// Everything needed to register a user class and to create its instances.
#[derive(Clone)]
pub struct StructInfo {
    /// Direct base: an engine class or another user class.
    pub(crate) base_class_name: &'static str,

    pub(crate) create_fn: sys::GDExtensionClassCreateInstance,
    pub(crate) free_fn: sys::GDExtensionClassFreeInstance,
    pub(crate) factory: ErasedFactoryFn,
    pub(crate) type_id: TypeId,
    pub(crate) is_abstract: bool,
}

impl StructInfo {
    /// Describes user class `T`. Abstract classes are registered, but the engine refuses to instantiate them.
    pub fn of<T: UserClass>(is_abstract: bool) -> Self {
        let Some(base_class_name) = parent_name::<T>() else {
            panic!("user class {} must have a base class", T::CLASS_NAME);
        };

        Self {
            base_class_name,
            create_fn: Some(callbacks::create::<T>),
            free_fn: Some(callbacks::free),
            factory: factory::<T>,
            type_id: TypeId::of::<T>(),
            is_abstract,
        }
    }
}

impl fmt::Debug for StructInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructInfo")
            .field("base_class_name", &self.base_class_name)
            .field("is_abstract", &self.is_abstract)
            .finish_non_exhaustive()
    }
}
