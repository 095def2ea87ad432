/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! `inherits_transitive_*` macros: implement [`Inherits`](crate::obj::Inherits) for a class and all its engine
//! ancestors. Used by the engine classes themselves and by `#[derive(GodotClass)]`.

#[macro_export]
#[doc(hidden)]
macro_rules! inherits_transitive_Object {
    ($T:ty) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::Object> for $T {}
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! inherits_transitive_RefCounted {
    ($T:ty) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::RefCounted> for $T {}
        $crate::inherits_transitive_Object!($T);
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! inherits_transitive_Node {
    ($T:ty) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::Node> for $T {}
        $crate::inherits_transitive_Object!($T);
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! inherits_transitive_CanvasItem {
    ($T:ty) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::CanvasItem> for $T {}
        $crate::inherits_transitive_Node!($T);
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! inherits_transitive_Node2D {
    ($T:ty) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::Node2D> for $T {}
        $crate::inherits_transitive_CanvasItem!($T);
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! inherits_transitive_Node3D {
    ($T:ty) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::Node3D> for $T {}
        $crate::inherits_transitive_Node!($T);
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! inherits_transitive_ResourceImporter {
    ($T:ty) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::ResourceImporter> for $T {}
        $crate::inherits_transitive_RefCounted!($T);
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! inherits_transitive_EditorImportPlugin {
    ($T:ty) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::EditorImportPlugin> for $T {}
        $crate::inherits_transitive_ResourceImporter!($T);
    };
}

pub use crate::{
    inherits_transitive_CanvasItem, inherits_transitive_EditorImportPlugin, inherits_transitive_Node,
    inherits_transitive_Node2D, inherits_transitive_Node3D, inherits_transitive_Object,
    inherits_transitive_RefCounted, inherits_transitive_ResourceImporter,
};
