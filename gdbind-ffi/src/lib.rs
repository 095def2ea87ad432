/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Low level bindings to the engine's C extension interface.
//!
//! Contains the raw C types, the interface function table, process-wide binding storage, call frames and method-bind
//! tables. Higher-level handles live in `gdbind-core`.

#![cfg_attr(test, allow(unused))]

mod binding;
mod error;
mod global;
mod godot_ffi;
mod init_level;
mod interface;
mod lifecycle;
mod opaque;
#[doc(hidden)]
pub mod plugins;
mod string_cache;
mod toolbox;
mod types;

pub mod conv;
pub mod frame;
pub mod method_table;

// See https://github.com/dtolnay/paste/issues/69#issuecomment-962418430
// and https://users.rust-lang.org/t/proc-macros-using-third-party-crate/42465/4
#[doc(hidden)]
pub use paste;

pub use binding::*;
pub use error::BindError;
pub use frame::{CallFrame, FrameArg, FrameArgObject, FrameRet, FrameRetObject, Ret, ReturnMeta, FRAME_CAPACITY};
pub use global::{Global, GlobalGuard, InitCell};
pub use godot_ffi::{GodotFfi, PtrcallType};
pub use init_level::InitLevel;
pub use interface::{binding_token, GDExtensionInterface, EMPTY_BINDING_CALLBACKS};
pub use lifecycle::{
    BuiltinLifecycleTable, BuiltinMethodFn, PtrConstructorFn, PtrDestructorFn, VariantConverters, VariantFromTypeFn,
    VariantToTypeFn,
};
pub use method_table::{ClassMethod, MethodBind, ReturnOwnership};
pub use opaque::Opaque;
pub use string_cache::StringCache;
pub use toolbox::*;
pub use types::*;
