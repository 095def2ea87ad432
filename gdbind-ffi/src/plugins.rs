/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Class plugins that user code contributes from anywhere in the crate graph.
//!
//! Each `#[derive(GodotClass)]` and each `#[godot_api]` block expands to a `plugin_add!`, which pushes one
//! `ClassPlugin` (struct info, inherent impl or interface impl) into the registry declared in `gdbind-core`. The push
//! runs as a static constructor, before the engine loads the library. `ClassDb::initialize()` reads the registry once
//! with `plugin_foreach!` and groups the records by class; the order of the records is unspecified.

use std::sync::{Mutex, PoisonError};

/// Records collected by static constructors.
///
/// Constructors cannot propagate a poisoned lock, so both sides ignore poisoning.
#[doc(hidden)]
pub struct PluginRegistry<T> {
    plugins: Mutex<Vec<T>>,
}

impl<T> PluginRegistry<T> {
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self {
            plugins: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, plugin: T) {
        self.plugins.lock().unwrap_or_else(PoisonError::into_inner).push(plugin);
    }

    /// Visits all records while holding the lock; `visit` must not add records.
    pub fn for_each(&self, mut visit: impl FnMut(&T)) {
        let plugins = self.plugins.lock().unwrap_or_else(PoisonError::into_inner);
        plugins.iter().for_each(|plugin| visit(plugin));
    }
}

// Link-section attributes make even this safe code fall under unsafe_code lints:
//   note: the program's behavior with overridden link sections on items is unpredictable

/// Declares registry `$registry` for plugins of type `$Type`.
#[doc(hidden)]
#[macro_export]
macro_rules! plugin_registry {
    ($vis:vis $registry:ident: $Type:ty) => {
        $crate::paste::paste! {
            #[used]
            #[allow(non_upper_case_globals)]
            #[doc(hidden)]
            $vis static [< __gdbind_plugin_ $registry >]: $crate::plugins::PluginRegistry<$Type> =
                $crate::plugins::PluginRegistry::new();
        }
    };
}

#[doc(hidden)]
#[macro_export]
#[allow(clippy::deprecated_cfg_attr)]
#[cfg_attr(rustfmt, rustfmt::skip)]
// ^ skip: paste's [< >] syntax chokes fmt
macro_rules! plugin_add_inner {
    ($registry:ident; $plugin:expr; $( $path_tt:tt )* ) => {
        const _: () = {
            #[allow(non_upper_case_globals)]
            #[used]
            #[cfg_attr(target_os = "windows", link_section = ".CRT$XCU")]
            #[cfg_attr(any(target_os = "macos", target_os = "ios"), link_section = "__DATA,__mod_init_func")]
            #[cfg_attr(
                any(
                    target_os = "linux",
                    target_os = "android",
                    target_os = "freebsd",
                    target_os = "netbsd",
                    target_os = "openbsd",
                ),
                link_section = ".init_array"
            )]
            static __init: extern "C" fn() = {
                #[cfg_attr(any(target_os = "linux", target_os = "android"), link_section = ".text.startup")]
                extern "C" fn __register_plugin() {
                    $crate::paste::paste!( $( $path_tt )* [< __gdbind_plugin_ $registry >] ).push($plugin);
                }
                __register_plugin
            };
        };
    };
}

/// Adds `$plugin` to `$registry`, optionally found under `$path`, at program start.
#[doc(hidden)]
#[macro_export]
macro_rules! plugin_add {
    ( $registry:ident; $plugin:expr ) => {
        $crate::plugin_add_inner!($registry; $plugin; );
    };

    ( $registry:ident in $path:path; $plugin:expr ) => {
        $crate::plugin_add_inner!($registry; $plugin; $path ::);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! plugin_foreach_inner {
    ( $registry:ident; $visit:expr; $( $path_tt:tt )* ) => {
        $crate::paste::paste!( $( $path_tt )* [< __gdbind_plugin_ $registry >] ).for_each($visit)
    };
}

/// Runs `$visit` on every plugin of `$registry`, in unspecified order.
#[doc(hidden)]
#[macro_export]
macro_rules! plugin_foreach {
    ( $registry:ident; $visit:expr ) => {
        $crate::plugin_foreach_inner!($registry; $visit; )
    };

    ( $registry:ident in $path:path; $visit:expr ) => {
        $crate::plugin_foreach_inner!($registry; $visit; $path ::)
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    plugin_registry!(NAMES: &'static str);

    plugin_add!(NAMES; "Node");
    plugin_add!(NAMES; "Sprite2D");
    plugin_add!(NAMES; "RefCounted");

    #[test]
    fn constructors_fill_registry_before_main() {
        let mut seen = HashSet::new();

        plugin_foreach!(NAMES; |name: &&'static str| {
            seen.insert(*name);
        });

        assert_eq!(seen, HashSet::from(["Node", "Sprite2D", "RefCounted"]));
    }

    #[test]
    fn registry_outlives_poisoning() {
        let registry = super::PluginRegistry::new();
        registry.push(1);

        let _ = std::panic::catch_unwind(|| registry.for_each(|_| panic!("visitor failed")));

        registry.push(2);
        let mut total = 0;
        registry.for_each(|n| total += n);
        assert_eq!(total, 3);
    }
}
