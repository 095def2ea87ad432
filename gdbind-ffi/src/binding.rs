/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Process-wide binding state: interface table, library pointer, lifecycle table and configuration.

use std::ffi::CStr;
use std::fmt;
use std::thread::{self, ThreadId};

use crate as sys;
use crate::{BindError, BuiltinLifecycleTable, GDExtensionInterface, InitCell};

/// Settings chosen by the extension library at load time; read-only afterwards.
#[derive(Clone, Debug)]
pub struct BindConfig {
    /// Print handles that are still alive when the library is unloaded (needs the `trace` feature to count them).
    pub report_leaked_handles: bool,

    /// Print every init-level transition to stderr.
    pub log_level_transitions: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            report_leaked_handles: cfg!(feature = "trace"),
            log_level_transitions: cfg!(feature = "debug-log"),
        }
    }
}

/// Version of the engine that loaded the library.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct GodotVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub full_string: String,
}

impl fmt::Display for GodotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.full_string.is_empty() {
            write!(f, " ({})", self.full_string)?;
        }
        Ok(())
    }
}

pub struct GodotBinding {
    interface: GDExtensionInterface,
    library: sys::GDExtensionClassLibraryPtr,
    lifecycle: BuiltinLifecycleTable,
    version: GodotVersion,
    config: BindConfig,
    main_thread: ThreadId,
}

// SAFETY: the library pointer is an opaque token that is never dereferenced on the Rust side, and the tables only hold
// function pointers. Everything is immutable after initialization.
unsafe impl Sync for GodotBinding {}
unsafe impl Send for GodotBinding {}

static BINDING: InitCell<GodotBinding> = InitCell::new("gdbind binding");

/// Loads the interface and lifecycle tables and stores them process-wide.
///
/// Returns an error if the engine does not provide a required function.
///
/// # Panics
/// If the binding has already been initialized.
///
/// # Safety
/// - `get_proc_address` and `library` must be the values handed over by the engine at library load.
/// - Must not be called concurrently with any other function of this crate.
pub unsafe fn initialize(
    get_proc_address: sys::GDExtensionInterfaceGetProcAddress,
    library: sys::GDExtensionClassLibraryPtr,
    config: BindConfig,
) -> Result<(), BindError> {
    if BINDING.is_initialized() {
        panic!("gdbind binding already initialized; initialize must only be called once");
    }

    sys::out!("Initialize gdbind binding...");
    let interface = GDExtensionInterface::load(get_proc_address)?;
    let version = load_version(&interface);
    sys::out!("Engine version: {version}");

    let lifecycle = BuiltinLifecycleTable::load(&interface)?;
    sys::out!("Loaded builtin lifecycle table.");

    BINDING.initialize(GodotBinding {
        interface,
        library,
        lifecycle,
        version,
        config,
        main_thread: thread::current().id(),
    });

    Ok(())
}

/// Whether [`initialize()`] has completed.
pub fn is_initialized() -> bool {
    BINDING.is_initialized()
}

/// # Panics
/// If the binding is not initialized.
#[inline]
pub fn get_interface() -> &'static GDExtensionInterface {
    let binding = BINDING.get();

    #[cfg(all(debug_assertions, not(feature = "experimental-threads")))]
    assert_main_thread(binding);

    &binding.interface
}

/// Whether the current thread is the one that loaded the library.
///
/// # Panics
/// If the binding is not initialized.
pub fn is_main_thread() -> bool {
    thread::current().id() == BINDING.get().main_thread
}

#[cfg(all(debug_assertions, not(feature = "experimental-threads")))]
fn assert_main_thread(binding: &GodotBinding) {
    assert_eq!(
        thread::current().id(),
        binding.main_thread,
        "attempted to access the engine from a thread other than the one that loaded the library; \
        enable the \"experimental-threads\" feature to lift this check"
    );
}

#[inline]
pub fn get_library() -> sys::GDExtensionClassLibraryPtr {
    BINDING.get().library
}

#[inline]
pub fn builtin_lifecycle_api() -> &'static BuiltinLifecycleTable {
    &BINDING.get().lifecycle
}

pub fn godot_version() -> &'static GodotVersion {
    &BINDING.get().version
}

pub fn config() -> &'static BindConfig {
    &BINDING.get().config
}

unsafe fn load_version(interface: &GDExtensionInterface) -> GodotVersion {
    let mut raw = sys::GDExtensionGodotVersion {
        major: 0,
        minor: 0,
        patch: 0,
        string: std::ptr::null(),
    };
    (interface.get_godot_version)(&mut raw);

    let full_string = if raw.string.is_null() {
        String::new()
    } else {
        CStr::from_ptr(raw.string).to_string_lossy().into_owned()
    };

    GodotVersion {
        major: raw.major,
        minor: raw.minor,
        patch: raw.patch,
        full_string,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_display() {
        let mut version = GodotVersion {
            major: 4,
            minor: 2,
            patch: 1,
            full_string: String::new(),
        };
        assert_eq!(version.to_string(), "4.2.1");

        version.full_string = "Godot Engine v4.2.1.stable".to_string();
        assert_eq!(version.to_string(), "4.2.1 (Godot Engine v4.2.1.stable)");
    }

    #[test]
    #[should_panic(expected = "gdbind binding queried before initialization")]
    fn query_before_initialize_panics() {
        get_interface();
    }
}
