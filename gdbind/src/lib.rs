/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Rust bindings core for the GDExtension C ABI
//!
//! An extension library is a shared object that the engine loads through a single C entry point. This crate provides
//! everything on the Rust side of that boundary:
//!
//! * [`builtin`]: value types that cross the ABI (`GString`, `Variant`, `Array`, vectors, …), with explicit ownership
//!   of engine-allocated payloads.
//! * [`classes`]: façades of engine classes, whose methods are ptrcalls through method binds resolved at startup.
//! * [`obj`]: `Gd<T>` object handles and the traits user classes implement.
//! * [`registry`]: the class registry, through which the engine instantiates user classes and calls their virtual
//!   methods.
//! * [`init`]: the [`ExtensionLibrary`](init::ExtensionLibrary) trait and initialization levels.
//!
//! ```ignore
//! use gdbind::prelude::*;
//!
//! struct MyExtension;
//!
//! #[gdextension]
//! unsafe impl ExtensionLibrary for MyExtension {}
//!
//! #[derive(GodotClass)]
//! #[class(base = Node, init)]
//! struct Player {
//!     #[base]
//!     base: Base<Node>,
//!     #[init(val = 100)]
//!     health: i64,
//! }
//!
//! #[godot_api]
//! impl INode for Player {
//!     fn ready(&mut self) {
//!         godot_print!("player ready with {} health", self.health);
//!     }
//! }
//! ```
//!
//! # Cargo features
//!
//! * **`experimental-threads`**: lifts the debug-build check that the engine is only accessed from the thread that
//!   loaded the library. Instance storage is guarded by a mutex with or without it; `Gd<T>` stays `!Send`.

#[doc(inline)]
pub use gdbind_core::{builtin, classes, handle, log, meta, obj, registry};

#[doc(hidden)]
pub use gdbind_core::sys;

pub mod init {
    pub use gdbind_core::init::*;

    // Re-exports
    pub use gdbind_macros::gdextension;
}

/// Export user-defined classes and virtual methods to be called by the engine.
pub mod register {
    pub use gdbind_macros::{godot_api, GodotClass};
}

#[doc(hidden)]
pub use gdbind_core::private;

pub mod prelude;
