/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Engine classes: façades for engine objects, reached through [`Gd<T>`][crate::obj::Gd].
//!
//! Every class follows the same contract: a `#[repr(C)]` struct wrapping the object pointer, construction through the
//! engine's class database, one method per method bind (frame, arguments, dispatch, return), `Deref` to the base class
//! plus [`Inherits`][crate::obj::Inherits] impls for upcasts, an interface trait `I…` listing the virtual methods
//! that user classes can override, and an [`EngineClassInfo`] entry for the class registry.

use crate::registry::EngineClassInfo;

/// Object callbacks every interface trait offers, next to its virtual methods.
///
/// Unlike virtuals, these are not looked up by name: `#[godot_api]` registers a callback for each of them the impl
/// overrides.
macro_rules! object_callback_methods {
    () => {
        /// Called for every notification the object receives, `what` being the notification code.
        fn on_notification(&mut self, what: i32) {
            unimplemented!()
        }

        /// Value of a property the class handles itself, or `None` to let the engine look it up.
        fn get_property(&self, property: $crate::builtin::StringName) -> Option<$crate::builtin::Variant> {
            unimplemented!()
        }

        /// Sets a property the class handles itself. Returns `false` to let the engine set it instead.
        fn set_property(&mut self, property: $crate::builtin::StringName, value: $crate::builtin::Variant) -> bool {
            unimplemented!()
        }

        /// Properties added to the ones the engine reports for the object.
        fn get_property_list(&mut self) -> Vec<$crate::meta::PropertyInfo> {
            unimplemented!()
        }

        /// Value `property` reverts to in the editor, or `None` if it cannot be reverted.
        fn property_get_revert(&self, property: $crate::builtin::StringName) -> Option<$crate::builtin::Variant> {
            unimplemented!()
        }
    };
}

mod canvas_item;
mod editor_import_plugin;
mod node;
mod node_2d;
mod node_3d;
mod object;
mod resource_importer;

pub(crate) mod ref_counted;

pub mod class_macros;

pub use canvas_item::{CanvasItem, ICanvasItem};
pub use editor_import_plugin::{EditorImportPlugin, IEditorImportPlugin};
pub use node::{INode, Node};
pub use node_2d::{INode2D, Node2D};
pub use node_3d::{INode3D, Node3D};
pub use object::{IObject, Object};
pub use ref_counted::{IRefCounted, RefCounted};
pub use resource_importer::{IResourceImporter, ResourceImporter};

/// Engine classes of this crate, in hierarchy order.
pub fn engine_classes() -> Vec<EngineClassInfo> {
    vec![
        EngineClassInfo::of::<Object>(object::load_tables),
        EngineClassInfo::of::<RefCounted>(ref_counted::load_tables),
        EngineClassInfo::of::<Node>(node::load_tables),
        EngineClassInfo::of::<CanvasItem>(canvas_item::load_tables),
        EngineClassInfo::of::<Node2D>(node_2d::load_tables),
        EngineClassInfo::of::<Node3D>(node_3d::load_tables),
        EngineClassInfo::of::<ResourceImporter>(|| Ok(())),
        EngineClassInfo::of::<EditorImportPlugin>(|| Ok(())),
    ]
}

/// Declares the façade struct of an engine class and its `GodotClass`, `EngineClass`, `Deref` and `Debug` impls.
#[macro_export]
#[doc(hidden)]
macro_rules! engine_class {
    (
        $( #[$attr:meta] )*
        pub struct $Class:ident: $Base:ty, $Memory:ident, $Level:ident;
    ) => {
        $( #[$attr] )*
        #[repr(C)]
        pub struct $Class {
            object_ptr: $crate::sys::GDExtensionObjectPtr,
        }

        impl $crate::obj::GodotClass for $Class {
            type Base = $Base;
            type Memory = $crate::obj::$Memory;

            const CLASS_NAME: &'static str = stringify!($Class);
            const INIT_LEVEL: $crate::sys::InitLevel = $crate::sys::InitLevel::$Level;
        }

        // SAFETY: #[repr(C)] struct with a single object pointer field.
        unsafe impl $crate::obj::EngineClass for $Class {
            fn obj_sys(&self) -> $crate::sys::GDExtensionObjectPtr {
                self.object_ptr
            }
        }

        impl std::ops::Deref for $Class {
            type Target = $Base;

            fn deref(&self) -> &Self::Target {
                // SAFETY: both façades wrap the same object pointer; the object is an instance of the base class.
                unsafe { &*(self as *const Self as *const $Base) }
            }
        }

        impl std::ops::DerefMut for $Class {
            fn deref_mut(&mut self) -> &mut Self::Target {
                // SAFETY: see Deref.
                unsafe { &mut *(self as *mut Self as *mut $Base) }
            }
        }

        impl std::fmt::Debug for $Class {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:p})", stringify!($Class), self.object_ptr)
            }
        }
    };
}

/// Calls a method of a class's method table on `receiver`.
///
/// ```ignore
/// class_ptrcall!(NODE_METHODS.set_name(self.object_ptr), &name => ())
/// ```
macro_rules! class_ptrcall {
    ($table:ident . $method:ident ($receiver:expr) $(, $arg:expr)* => $Ret:ty) => {{
        let method = &$table.get().$method;
        let arity = <[&str]>::len(&[$( stringify!($arg) ),*]);

        // SAFETY: the receiver is a live instance of the table's class; arguments and return type follow the engine
        // signature of the method.
        unsafe {
            $crate::meta::signature::out_class_ptrcall::<$Ret>(method, $receiver, arity, |frame| {
                $( frame.arg($arg); )*
            })
        }
    }};
}

pub(crate) use class_ptrcall;
