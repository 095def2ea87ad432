/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Class registration and virtual dispatch.
//!
//! All classes the binding knows (engine classes of the wrapper layer and user classes declared with
//! `#[derive(GodotClass)]`) are collected into the [`ClassDb`] once, when the library is loaded. User classes are then
//! registered with the engine at their init level, and virtual calls of the engine are routed to the nearest class in
//! the inheritance chain that implements them. Methods exposed with `#[func]` are registered right after their class.

mod class;
mod class_db;

pub mod callbacks;
pub mod method;
pub mod plugin;
pub mod trampoline;

pub use class_db::{ClassDb, ClassKind, ClassRecord, EngineClassInfo, ErasedFactoryFn};

pub(crate) use class::{register_user_classes, unregister_user_classes};
