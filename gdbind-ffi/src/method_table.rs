/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Method-bind tables: per-class lookup of native method binds, resolved once at the class's init level.

use std::collections::HashMap;
use std::fmt;

use crate as sys;
use crate::{BindError, Global, StringCache};

/// How the object returned by a method is owned by the caller.
///
/// Recorded per method bind next to its token; the dispatcher hands it to the return decoder. Payload returns
/// (strings, arrays, variants) are always copies and therefore owned, regardless of this value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ReturnOwnership {
    /// The caller receives a reference it must release (reference-counted) or an object it must free (manual).
    Owned,

    /// The engine keeps ownership; the handle must not release or free.
    Borrowed,

    /// Object lives as long as the receiver, e.g. a child returned by its parent.
    BoundToReceiver,
}

/// Opaque method-bind token issued by the engine.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct MethodBind(sys::GDExtensionMethodBindPtr);

// SAFETY: token is an engine-owned immutable handle, valid for the lifetime of the process.
unsafe impl Send for MethodBind {}
unsafe impl Sync for MethodBind {}

impl MethodBind {
    pub fn sys(self) -> sys::GDExtensionMethodBindPtr {
        self.0
    }
}

impl fmt::Debug for MethodBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodBind({:p})", self.0)
    }
}

/// Entry of a method table: resolved token plus the metadata needed to dispatch through it.
#[derive(Copy, Clone, Debug)]
pub struct ClassMethod {
    pub class_name: &'static str,
    pub method_name: &'static str,
    pub hash: i64,
    pub bind: MethodBind,
    pub ownership: ReturnOwnership,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Resolution

type ResolveKey = (&'static str, &'static str, i64);

/// Process-wide resolution cache; the engine is asked at most once per `(class, method, hash)`.
static RESOLVED: Global<HashMap<ResolveKey, MethodBind>> = Global::default();

/// Resolves a method bind, returning the cached token if the method was resolved before.
pub fn try_resolve(class_name: &'static str, method_name: &'static str, hash: i64) -> Result<MethodBind, BindError> {
    let mut resolved = RESOLVED.lock();
    if let Some(bind) = resolved.get(&(class_name, method_name, hash)) {
        return Ok(*bind);
    }

    sys::out!("Resolve method bind {class_name}::{method_name} (hash {hash})...");

    let interface = sys::get_interface();
    let mut string_names = StringCache::new(interface, sys::builtin_lifecycle_api().string_name_destroy);
    let class_sname = string_names.fetch(class_name);
    let method_sname = string_names.fetch(method_name);

    // SAFETY: string names are valid for the duration of the call.
    let raw = unsafe { (interface.classdb_get_method_bind)(class_sname, method_sname, hash) };
    if raw.is_null() {
        return Err(BindError::UnresolvedMethod {
            class_name,
            method_name,
            hash,
        });
    }

    let bind = MethodBind(raw);
    resolved.insert((class_name, method_name, hash), bind);
    Ok(bind)
}

/// Resolves a method into a table entry.
pub fn try_load_class_method(
    class_name: &'static str,
    method_name: &'static str,
    hash: i64,
    ownership: ReturnOwnership,
) -> Result<ClassMethod, BindError> {
    let bind = try_resolve(class_name, method_name, hash)?;

    Ok(ClassMethod {
        class_name,
        method_name,
        hash,
        bind,
        ownership,
    })
}

/// Number of distinct method binds resolved so far.
pub fn resolved_count() -> usize {
    RESOLVED.lock().len()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Declaration

/// Declares the method table of one engine class.
///
/// Generates the table struct with one [`ClassMethod`] per entry, the static cell holding it and a loader. Each entry
/// names the method, its API hash and the [`ReturnOwnership`] of its result.
///
/// ```ignore
/// method_table! {
///     pub struct NodeMethods in NODE_METHODS for "Node" {
///         set_name = 3304788590 => Owned,
///         get_child = 541253412 => BoundToReceiver,
///     }
/// }
///
/// // At init level:
/// NODE_METHODS.initialize(NodeMethods::try_load()?);
/// // In the façade:
/// let method = &NODE_METHODS.get().get_child;
/// ```
#[macro_export]
macro_rules! method_table {
    (
        $( #[$attr:meta] )*
        $vis:vis struct $Table:ident in $CELL:ident for $class:literal {
            $( $method:ident = $hash:literal => $ownership:ident ),* $(,)?
        }
    ) => {
        $( #[$attr] )*
        #[derive(Debug)]
        $vis struct $Table {
            $( pub $method: $crate::ClassMethod, )*
        }

        $vis static $CELL: $crate::InitCell<$Table> =
            $crate::InitCell::new(concat!("method table for ", $class));

        impl $Table {
            pub const CLASS_NAME: &'static str = $class;

            /// Resolves every entry, reporting the first failure.
            pub fn try_load() -> Result<Self, $crate::BindError> {
                Ok(Self {
                    $(
                        $method: $crate::method_table::try_load_class_method(
                            $class,
                            stringify!($method),
                            $hash,
                            $crate::ReturnOwnership::$ownership,
                        )?,
                    )*
                })
            }
        }
    };
}
