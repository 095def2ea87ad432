/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Often-imported symbols.

pub use super::builtin::{
    Array, Color, Dictionary, FromGodot, GString, StringName, ToGodot, Variant, VariantType, Vector2, Vector3,
};
pub use super::classes::{
    CanvasItem, EditorImportPlugin, ICanvasItem, IEditorImportPlugin, INode, INode2D, INode3D, IObject, IRefCounted,
    IResourceImporter, Node, Node2D, Node3D, Object, RefCounted, ResourceImporter,
};
pub use super::init::{gdextension, ExtensionLibrary, InitLevel};
pub use super::log::{godot_error, godot_print, godot_warn};
pub use super::meta::PropertyInfo;
pub use super::obj::{Base, BaseMut, Gd, GdMut, GdRef, GodotClass, Inherits, InstanceId, UserInit};
pub use super::register::{godot_api, GodotClass};

// Make trait methods available.
#[rustfmt::skip] // One per line.
mod trait_reexports {
    pub use crate::obj::NewAlloc as _;
    pub use crate::obj::NewGd as _;
    pub use crate::obj::WithBaseField as _; // base(), base_mut(), to_gd()
}

pub use trait_reexports::*;
