/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::c_void;

use gdbind_ffi as sys;
use sys::{interface_fn, Global, InitLevel};

use crate::builtin::StringName;
use crate::registry::{callbacks, ClassDb, ClassKind, ClassRecord};

/// User classes registered with the engine, in registration order.
static LOADED_CLASSES: Global<Vec<(InitLevel, &'static str)>> = Global::default();

/// Registers all user classes of `level` with the engine, every base before its subclasses.
pub(crate) fn register_user_classes(level: InitLevel) {
    let db = ClassDb::get();

    let mut pending: Vec<&'static ClassRecord> = db
        .records()
        .filter(|record| record.is_user_class() && record.init_level == level)
        .collect();

    // Depth in the hierarchy orders bases first; names keep the order deterministic.
    pending.sort_by_key(|record| (db.ancestors(record.name).count(), record.name));

    for record in pending {
        register_class_raw(db, record);
        LOADED_CLASSES.lock().push((level, record.name));

        for register_methods in &record.register_methods {
            register_methods();
        }
    }
}

/// Unregisters the user classes of `level`, in reverse registration order.
pub(crate) fn unregister_user_classes(level: InitLevel) {
    let classes: Vec<&'static str> = {
        let mut loaded = LOADED_CLASSES.lock();
        let (at_level, remaining): (Vec<_>, Vec<_>) = loaded.drain(..).partition(|(l, _)| *l == level);
        *loaded = remaining;
        at_level.into_iter().map(|(_, name)| name).collect()
    };

    for class_name in classes.into_iter().rev() {
        sys::out!("Unregister class:   {class_name} at level `{level:?}`");
        let name = StringName::from(class_name);

        // SAFETY: the class was registered by this library and has no live instances at deinit.
        unsafe { interface_fn!(classdb_unregister_extension_class)(sys::get_library(), name.sys()) };
    }
}

fn register_class_raw(db: &ClassDb, record: &'static ClassRecord) {
    let ClassKind::User {
        create_fn,
        free_fn,
        is_abstract,
    } = record.kind
    else {
        unreachable!("only user classes are registered with the engine");
    };

    let Some(parent) = record.parent else {
        unreachable!("user class {} without base", record.name);
    };

    sys::out!("Register class:   {} (base {parent}) at level `{:?}`", record.name, record.init_level);

    let overrides = db.resolve_callbacks(record.name);

    let info = sys::GDExtensionClassCreationInfo {
        is_virtual: sys::conv::SYS_FALSE,
        is_abstract: sys::conv::bool_to_sys(is_abstract),
        set_func: overrides.set_property_fn,
        get_func: overrides.get_property_fn,
        get_property_list_func: overrides.get_property_list_fn,
        free_property_list_func: overrides.free_property_list_fn,
        property_can_revert_func: overrides.property_can_revert_fn,
        property_get_revert_func: overrides.property_get_revert_fn,
        notification_func: overrides.notification_fn,
        // Stringification goes through the `_to_string` virtual.
        to_string_func: None,
        reference_func: Some(callbacks::reference),
        unreference_func: Some(callbacks::unreference),
        create_instance_func: create_fn,
        free_instance_func: free_fn,
        get_virtual_func: Some(callbacks::get_virtual),
        get_rid_func: None,
        class_userdata: record as *const ClassRecord as *mut c_void,
    };

    let class_name = StringName::from(record.name);
    let parent_name = StringName::from(parent);

    // SAFETY: names are live for the call; the engine copies them. The record outlives the registration.
    unsafe {
        interface_fn!(classdb_register_extension_class)(
            sys::get_library(),
            class_name.sys(),
            parent_name.sys(),
            &info,
        );
    }
}
