/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbind_ffi as sys;

use crate::handle::audit;
use crate::registry::{self, ClassDb, ClassKind, EngineClassInfo};

pub use sys::{BindConfig, InitLevel};

#[doc(hidden)]
// Called by the `gdext_rust_init` symbol that #[gdextension] emits.
pub unsafe fn __gdext_load_library<E: ExtensionLibrary>(
    get_proc_address: sys::GDExtensionInterfaceGetProcAddress,
    library: sys::GDExtensionClassLibraryPtr,
    init: *mut sys::GDExtensionInitialization,
) -> sys::GDExtensionBool {
    let init_code = || {
        let config = BindConfig {
            report_leaked_handles: E::report_leaked_handles(),
            ..BindConfig::default()
        };

        if let Err(err) = sys::initialize(get_proc_address, library, config) {
            crate::godot_error!("gdbind refuses to load: {err}");
            return sys::conv::SYS_FALSE;
        }

        let mut engine_classes = crate::classes::engine_classes();
        engine_classes.extend(E::engine_classes());
        ClassDb::initialize(engine_classes);

        *init = sys::GDExtensionInitialization {
            minimum_initialization_level: E::min_level().to_sys(),
            userdata: std::ptr::null_mut(),
            initialize: Some(ffi_initialize_layer::<E>),
            deinitialize: Some(ffi_deinitialize_layer::<E>),
        };

        sys::conv::SYS_TRUE
    };

    let ctx = || "error when loading GDExtension library";
    let is_success = crate::private::handle_panic(ctx, init_code);

    is_success.unwrap_or(sys::conv::SYS_FALSE)
}

unsafe extern "C" fn ffi_initialize_layer<E: ExtensionLibrary>(
    _userdata: *mut std::ffi::c_void,
    init_level: sys::GDExtensionInitializationLevel,
) {
    let level = InitLevel::from_sys(init_level);
    let ctx = || format!("failed to initialize GDExtension level `{level:?}`");

    // Swallow panics; they were already reported.
    let _ = crate::private::handle_panic(ctx, || {
        initialize_level(level);
        E::on_level_init(level);
    });
}

unsafe extern "C" fn ffi_deinitialize_layer<E: ExtensionLibrary>(
    _userdata: *mut std::ffi::c_void,
    init_level: sys::GDExtensionInitializationLevel,
) {
    let level = InitLevel::from_sys(init_level);
    let ctx = || format!("failed to deinitialize GDExtension level `{level:?}`");

    let _ = crate::private::handle_panic(ctx, || {
        E::on_level_deinit(level);
        deinitialize_level(level);
    });
}

/// Loads the method tables of all engine classes of `level`, then registers the user classes of `level`.
/// Called before user code.
///
/// # Panics
/// If a method bind of the level cannot be resolved. The message names the method, its hash and the engine version.
pub fn initialize_level(level: InitLevel) {
    if sys::config().log_level_transitions {
        eprintln!("[gdbind] initialize level {level:?}");
    }

    let db = ClassDb::get();
    for record in db.records().filter(|record| record.init_level == level) {
        if let ClassKind::Engine { load_tables } = record.kind {
            if let Err(err) = load_tables() {
                panic!("{err}; engine version {}", sys::godot_version());
            }
            sys::out!("loaded method tables of {}", record.name);
        }
    }

    registry::register_user_classes(level);
}

/// Unregisters the user classes of `level`, in reverse registration order. Called after user code.
///
/// When the lowest level goes, handles still alive are reported as leaks (if enabled).
pub fn deinitialize_level(level: InitLevel) {
    if sys::config().log_level_transitions {
        eprintln!("[gdbind] deinitialize level {level:?}");
    }

    registry::unregister_user_classes(level);

    if level == InitLevel::Core && sys::config().report_leaked_handles {
        audit::report_leaks();
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Defines the entry point for a gdbind extension library.
///
/// Every library should have exactly one implementation of this trait. It is always used in combination with the
/// `#[gdextension]` proc-macro attribute, which emits the C entry point `gdext_rust_init`.
///
/// All classes marked with `#[derive(GodotClass)]` are registered automatically, without a central list.
///
/// ```ignore
/// struct MyExtension;
///
/// #[gdextension]
/// unsafe impl ExtensionLibrary for MyExtension {}
/// ```
///
/// # Safety
/// By using this trait, you acknowledge that the library runs inside the engine process and that the engine upholds
/// the initialization protocol (levels loaded in order, on the main thread).
pub unsafe trait ExtensionLibrary {
    /// Determines the initialization level at which the extension is loaded (`Scene` by default).
    ///
    /// If the level is lower than [`InitLevel::Scene`], the engine needs to be restarted to take changes into account.
    fn min_level() -> InitLevel {
        InitLevel::Scene
    }

    /// Custom logic when a certain init-level is loaded. Runs after this library registered its classes.
    #[allow(unused_variables)]
    fn on_level_init(level: InitLevel) {
        // Nothing by default.
    }

    /// Custom logic when a certain init-level is unloaded. Runs before this library unregisters its classes.
    #[allow(unused_variables)]
    fn on_level_deinit(level: InitLevel) {
        // Nothing by default.
    }

    /// Whether handles still alive at unload are printed. Counting needs the `trace` feature.
    fn report_leaked_handles() -> bool {
        cfg!(feature = "trace")
    }

    /// Additional engine classes with façades outside this crate, registered next to the built-in ones.
    fn engine_classes() -> Vec<EngineClassInfo> {
        Vec::new()
    }
}
