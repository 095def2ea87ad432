/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Callbacks that are passed as function pointers to the engine upon class registration.
//!
//! Re-exported to `crate::private`.
#![allow(clippy::missing_safety_doc)]

use std::collections::HashMap;
use std::ffi::c_void;
use std::panic::AssertUnwindSafe;
use std::ptr;

use gdbind_ffi as sys;
use sys::{interface_fn, Global, GodotFfi, PtrcallType};

use crate::builtin::{StringName, Variant};
use crate::meta::PropertyInfo;
use crate::obj::{cap, Base, GodotClass, UserClass};
use crate::private::handle_panic;
use crate::registry::{ClassDb, ClassRecord};
use crate::storage::{as_storage, InstanceStorage};

/// Property lists handed out to the engine: address of the first record, and record count.
static PROPERTY_LISTS: Global<HashMap<usize, usize>> = Global::default();

/// Engine FFI default constructor.
///
/// If the user constructor panics, null is returned.
pub unsafe extern "C" fn create<T: UserClass>(_class_userdata: *mut c_void) -> sys::GDExtensionObjectPtr {
    create_custom(T::__init).unwrap_or(ptr::null_mut())
}

pub(crate) fn create_custom<T, F>(make_user_instance: F) -> Result<sys::GDExtensionObjectPtr, String>
where
    T: UserClass,
    F: FnOnce(Base<T::NativeBase>) -> T,
{
    let base_class_name = StringName::from(<T::NativeBase as GodotClass>::CLASS_NAME);

    // SAFETY: construction by name of a registered engine class.
    let base_ptr = unsafe { interface_fn!(classdb_construct_object)(base_class_name.sys()) };
    if base_ptr.is_null() {
        let msg = format!(
            "engine failed to construct base {} of {}",
            <T::NativeBase as GodotClass>::CLASS_NAME,
            T::CLASS_NAME
        );
        crate::godot_error!("{msg}");
        return Err(msg);
    }

    // SAFETY: base_ptr is the freshly created base object, which owns the instance from now on.
    let base = unsafe { Base::from_sys(base_ptr) };

    // User constructor can panic, which crashes the engine if unhandled.
    let context = || format!("panic during {}::init() constructor", T::CLASS_NAME);
    let user_instance = match handle_panic(context, AssertUnwindSafe(|| make_user_instance(base))) {
        Ok(instance) => instance,
        Err(msg) => {
            // Creation of the extension instance failed; the base object would leak otherwise.
            // SAFETY: `base_ptr` was just created above and is not referenced anywhere else.
            unsafe { interface_fn!(object_destroy)(base_ptr) };
            return Err(msg);
        }
    };

    let storage = Box::new(InstanceStorage::new(T::CLASS_NAME, base_ptr, user_instance));
    let instance_ptr = Box::into_raw(storage) as sys::GDExtensionClassInstancePtr;

    let class_name = StringName::from(T::CLASS_NAME);

    // SAFETY: live base object; the storage is released in free().
    unsafe {
        interface_fn!(object_set_instance)(base_ptr, class_name.sys(), instance_ptr);
        interface_fn!(object_set_instance_binding)(
            base_ptr,
            sys::binding_token(),
            instance_ptr,
            &sys::EMPTY_BINDING_CALLBACKS,
        );
    }

    sys::out!("create callback: {} -> {:p}", T::CLASS_NAME, base_ptr);
    Ok(base_ptr)
}

/// Engine FFI destructor of the Rust part of an instance.
pub unsafe extern "C" fn free(_class_userdata: *mut c_void, instance: sys::GDExtensionClassInstancePtr) {
    if instance.is_null() {
        return;
    }

    let storage = instance as *mut InstanceStorage;
    let class_name = (*storage).class_name();
    sys::out!("free callback: {class_name}");

    // Guards handed out to Rust code still point into the instance.
    if (*storage).is_bound() {
        crate::godot_error!("{class_name} instance destroyed while bound; its Rust part is leaked");
        return;
    }

    let storage = Box::from_raw(storage);

    // User Drop impls may panic.
    let _ = handle_panic(|| format!("panic during drop of {class_name} instance"), AssertUnwindSafe(|| drop(storage)));
}

/// Engine FFI lookup of virtual methods, registered per user class. `class_userdata` points to the class record.
pub unsafe extern "C" fn get_virtual(
    class_userdata: *mut c_void,
    name: sys::GDExtensionConstStringNamePtr,
) -> sys::GDExtensionClassCallVirtual {
    // SAFETY: userdata was set to a record of the frozen class registry, which lives for the rest of the process.
    let record = &*(class_userdata as *const ClassRecord);

    // SAFETY: the engine passes a live StringName.
    let method_name = StringName::from_sys_borrowed(name).to_rust_string();

    let context = || format!("virtual lookup {}.{method_name}", record.name);
    handle_panic(context, AssertUnwindSafe(|| ClassDb::get().resolve_virtual(record.name, &method_name))).unwrap_or(None)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Object callbacks, resolved per class from the nearest user class that overrides them

pub unsafe extern "C" fn on_notification<T: cap::GodotNotification>(instance: sys::GDExtensionClassInstancePtr, what: i32) {
    let storage = as_storage(instance);

    let context = || format!("{}::on_notification({what})", T::CLASS_NAME);
    let _ = handle_panic(context, AssertUnwindSafe(|| storage.get_mut::<T>().__godot_notification(what)));
}

pub unsafe extern "C" fn get_property<T: cap::GodotGet>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    ret: sys::GDExtensionVariantPtr,
) -> sys::GDExtensionBool {
    let storage = as_storage(instance);
    let property = StringName::new_from_sys(name);

    let context = || format!("{}::get_property({property})", T::CLASS_NAME);
    let value = handle_panic(context, AssertUnwindSafe(|| storage.get::<T>().__godot_get_property(property.clone())));

    match value {
        Ok(Some(value)) => {
            value.move_return_ptr(ret, PtrcallType::Standard);
            sys::conv::SYS_TRUE
        }
        _ => sys::conv::SYS_FALSE,
    }
}

pub unsafe extern "C" fn set_property<T: cap::GodotSet>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    value: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionBool {
    let storage = as_storage(instance);
    let property = StringName::new_from_sys(name);
    let value = Variant::new_from_sys(value);

    let context = || format!("{}::set_property({property})", T::CLASS_NAME);
    let handled = handle_panic(
        context,
        AssertUnwindSafe(|| storage.get_mut::<T>().__godot_set_property(property.clone(), value)),
    );

    sys::conv::bool_to_sys(handled.unwrap_or(false))
}

/// Hands the engine a list it must return through [`free_property_list`].
pub unsafe extern "C" fn get_property_list<T: cap::GodotGetPropertyList>(
    instance: sys::GDExtensionClassInstancePtr,
    count: *mut u32,
) -> *const sys::GDExtensionPropertyInfo {
    let storage = as_storage(instance);

    let context = || format!("{}::get_property_list", T::CLASS_NAME);
    let list = handle_panic(context, AssertUnwindSafe(|| storage.get_mut::<T>().__godot_get_property_list()))
        .unwrap_or_default();

    *count = list.len() as u32;
    if list.is_empty() {
        return ptr::null();
    }

    let list_sys: Box<[sys::GDExtensionPropertyInfo]> =
        list.into_iter().map(PropertyInfo::into_owned_property_sys).collect();

    let len = list_sys.len();
    let list_ptr = Box::into_raw(list_sys) as *const sys::GDExtensionPropertyInfo;
    PROPERTY_LISTS.lock().insert(list_ptr as usize, len);

    list_ptr
}

pub unsafe extern "C" fn free_property_list(
    _instance: sys::GDExtensionClassInstancePtr,
    list: *const sys::GDExtensionPropertyInfo,
) {
    if list.is_null() {
        return;
    }

    let Some(len) = PROPERTY_LISTS.lock().remove(&(list as usize)) else {
        crate::godot_error!("free_property_list: list {list:p} was not handed out by this library");
        return;
    };

    // SAFETY: list and len were recorded by get_property_list(); removing the entry makes this the only release.
    let list_sys = Box::from_raw(ptr::slice_from_raw_parts_mut(list as *mut sys::GDExtensionPropertyInfo, len));
    for info in list_sys.iter() {
        PropertyInfo::free_owned_property_sys(*info);
    }
}

pub unsafe extern "C" fn property_can_revert<T: cap::GodotPropertyGetRevert>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
) -> sys::GDExtensionBool {
    sys::conv::bool_to_sys(raw_property_get_revert::<T>(instance, name).is_some())
}

pub unsafe extern "C" fn property_get_revert<T: cap::GodotPropertyGetRevert>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
    ret: sys::GDExtensionVariantPtr,
) -> sys::GDExtensionBool {
    match raw_property_get_revert::<T>(instance, name) {
        Some(value) => {
            value.move_return_ptr(ret, PtrcallType::Standard);
            sys::conv::SYS_TRUE
        }
        None => sys::conv::SYS_FALSE,
    }
}

unsafe fn raw_property_get_revert<T: cap::GodotPropertyGetRevert>(
    instance: sys::GDExtensionClassInstancePtr,
    name: sys::GDExtensionConstStringNamePtr,
) -> Option<Variant> {
    let storage = as_storage(instance);
    let property = StringName::new_from_sys(name);

    let context = || format!("{}::property_get_revert({property})", T::CLASS_NAME);
    handle_panic(
        context,
        AssertUnwindSafe(|| storage.get::<T>().__godot_property_get_revert(property.clone())),
    )
    .unwrap_or(None)
}

pub unsafe extern "C" fn reference(instance: sys::GDExtensionClassInstancePtr) {
    as_storage(instance).on_inc_ref();
}

pub unsafe extern "C" fn unreference(instance: sys::GDExtensionClassInstancePtr) {
    as_storage(instance).on_dec_ref();
}
