/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Raw types of the C extension interface.
//!
//! Names follow the engine's `gdextension_interface.h`, so that a reader of the C header finds the same symbols here.

#![allow(non_camel_case_types, non_upper_case_globals)]

use std::ffi::{c_char, c_int, c_void};

use crate::opaque::Opaque;

pub type GDExtensionBool = u8;
pub type GDExtensionInt = i64;
pub type GDObjectInstanceID = u64;
pub type GDExtensionVariantType = c_int;
pub type GDExtensionInitializationLevel = c_int;

pub type GDExtensionVariantPtr = *mut c_void;
pub type GDExtensionConstVariantPtr = *const c_void;
pub type GDExtensionUninitializedVariantPtr = *mut c_void;
pub type GDExtensionStringNamePtr = *mut c_void;
pub type GDExtensionConstStringNamePtr = *const c_void;
pub type GDExtensionUninitializedStringNamePtr = *mut c_void;
pub type GDExtensionStringPtr = *mut c_void;
pub type GDExtensionConstStringPtr = *const c_void;
pub type GDExtensionUninitializedStringPtr = *mut c_void;
pub type GDExtensionObjectPtr = *mut c_void;
pub type GDExtensionConstObjectPtr = *const c_void;
pub type GDExtensionTypePtr = *mut c_void;
pub type GDExtensionConstTypePtr = *const c_void;
pub type GDExtensionUninitializedTypePtr = *mut c_void;
pub type GDExtensionMethodBindPtr = *const c_void;
pub type GDExtensionRefPtr = *mut c_void;
pub type GDExtensionConstRefPtr = *const c_void;
pub type GDExtensionClassInstancePtr = *mut c_void;
pub type GDExtensionClassLibraryPtr = *mut c_void;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Opaque payloads (64-bit pointers, single-precision floats)

pub type OpaqueString = Opaque<8>;
pub type OpaqueStringName = Opaque<8>;
pub type OpaqueArray = Opaque<8>;
pub type OpaqueDictionary = Opaque<8>;
pub type OpaqueVariant = Opaque<24>;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Variant types (subset understood by this binding)

pub const GDEXTENSION_VARIANT_TYPE_NIL: GDExtensionVariantType = 0;
pub const GDEXTENSION_VARIANT_TYPE_BOOL: GDExtensionVariantType = 1;
pub const GDEXTENSION_VARIANT_TYPE_INT: GDExtensionVariantType = 2;
pub const GDEXTENSION_VARIANT_TYPE_FLOAT: GDExtensionVariantType = 3;
pub const GDEXTENSION_VARIANT_TYPE_STRING: GDExtensionVariantType = 4;
pub const GDEXTENSION_VARIANT_TYPE_VECTOR2: GDExtensionVariantType = 5;
pub const GDEXTENSION_VARIANT_TYPE_VECTOR3: GDExtensionVariantType = 9;
pub const GDEXTENSION_VARIANT_TYPE_COLOR: GDExtensionVariantType = 20;
pub const GDEXTENSION_VARIANT_TYPE_STRING_NAME: GDExtensionVariantType = 21;
pub const GDEXTENSION_VARIANT_TYPE_OBJECT: GDExtensionVariantType = 24;
pub const GDEXTENSION_VARIANT_TYPE_DICTIONARY: GDExtensionVariantType = 27;
pub const GDEXTENSION_VARIANT_TYPE_ARRAY: GDExtensionVariantType = 28;

pub type GDExtensionCallErrorType = c_int;

pub const GDEXTENSION_CALL_OK: GDExtensionCallErrorType = 0;
pub const GDEXTENSION_CALL_ERROR_INVALID_METHOD: GDExtensionCallErrorType = 1;
pub const GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT: GDExtensionCallErrorType = 2;
pub const GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS: GDExtensionCallErrorType = 3;
pub const GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS: GDExtensionCallErrorType = 4;
pub const GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL: GDExtensionCallErrorType = 5;

pub type GDExtensionClassMethodArgumentMetadata = c_int;

pub const GDEXTENSION_METHOD_ARGUMENT_METADATA_NONE: GDExtensionClassMethodArgumentMetadata = 0;

pub const GDEXTENSION_METHOD_FLAG_NORMAL: u32 = 1;
pub const GDEXTENSION_METHOD_FLAG_STATIC: u32 = 32;
pub const GDEXTENSION_METHOD_FLAGS_DEFAULT: u32 = GDEXTENSION_METHOD_FLAG_NORMAL;

pub const GDEXTENSION_INITIALIZATION_CORE: GDExtensionInitializationLevel = 0;
pub const GDEXTENSION_INITIALIZATION_SERVERS: GDExtensionInitializationLevel = 1;
pub const GDEXTENSION_INITIALIZATION_SCENE: GDExtensionInitializationLevel = 2;
pub const GDEXTENSION_INITIALIZATION_EDITOR: GDExtensionInitializationLevel = 3;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Function pointer types

pub type GDExtensionInterfaceFunctionPtr = Option<unsafe extern "C" fn()>;
pub type GDExtensionInterfaceGetProcAddress =
    Option<unsafe extern "C" fn(p_function_name: *const c_char) -> GDExtensionInterfaceFunctionPtr>;

pub type GDExtensionPtrConstructor = Option<
    unsafe extern "C" fn(p_base: GDExtensionUninitializedTypePtr, p_args: *const GDExtensionConstTypePtr),
>;
pub type GDExtensionPtrDestructor = Option<unsafe extern "C" fn(p_base: GDExtensionTypePtr)>;
pub type GDExtensionPtrBuiltInMethod = Option<
    unsafe extern "C" fn(
        p_base: GDExtensionTypePtr,
        p_args: *const GDExtensionConstTypePtr,
        r_return: GDExtensionTypePtr,
        p_argument_count: c_int,
    ),
>;
pub type GDExtensionVariantFromTypeConstructorFunc =
    Option<unsafe extern "C" fn(r_dest: GDExtensionUninitializedVariantPtr, p_src: GDExtensionTypePtr)>;
pub type GDExtensionTypeFromVariantConstructorFunc =
    Option<unsafe extern "C" fn(r_dest: GDExtensionUninitializedTypePtr, p_src: GDExtensionVariantPtr)>;

pub type GDExtensionClassCallVirtual = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_args: *const GDExtensionConstTypePtr,
        r_ret: GDExtensionTypePtr,
    ),
>;
pub type GDExtensionClassGetVirtual = Option<
    unsafe extern "C" fn(p_class_userdata: *mut c_void, p_name: GDExtensionConstStringNamePtr) -> GDExtensionClassCallVirtual,
>;
pub type GDExtensionClassCreateInstance =
    Option<unsafe extern "C" fn(p_class_userdata: *mut c_void) -> GDExtensionObjectPtr>;
pub type GDExtensionClassFreeInstance =
    Option<unsafe extern "C" fn(p_class_userdata: *mut c_void, p_instance: GDExtensionClassInstancePtr)>;

pub type GDExtensionClassSet = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_name: GDExtensionConstStringNamePtr,
        p_value: GDExtensionConstVariantPtr,
    ) -> GDExtensionBool,
>;
pub type GDExtensionClassGet = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_name: GDExtensionConstStringNamePtr,
        r_ret: GDExtensionVariantPtr,
    ) -> GDExtensionBool,
>;
pub type GDExtensionClassGetPropertyList = Option<
    unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr, r_count: *mut u32) -> *const GDExtensionPropertyInfo,
>;
pub type GDExtensionClassFreePropertyList =
    Option<unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr, p_list: *const GDExtensionPropertyInfo)>;
pub type GDExtensionClassPropertyCanRevert = Option<
    unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr, p_name: GDExtensionConstStringNamePtr) -> GDExtensionBool,
>;
pub type GDExtensionClassPropertyGetRevert = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_name: GDExtensionConstStringNamePtr,
        r_ret: GDExtensionVariantPtr,
    ) -> GDExtensionBool,
>;
pub type GDExtensionClassNotification = Option<unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr, p_what: i32)>;
pub type GDExtensionClassToString = Option<
    unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr, r_is_valid: *mut GDExtensionBool, p_out: GDExtensionStringPtr),
>;
pub type GDExtensionClassReference = Option<unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr)>;
pub type GDExtensionClassUnreference = Option<unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr)>;
pub type GDExtensionClassGetRID = Option<unsafe extern "C" fn(p_instance: GDExtensionClassInstancePtr) -> u64>;

pub type GDExtensionClassMethodCall = Option<
    unsafe extern "C" fn(
        method_userdata: *mut c_void,
        p_instance: GDExtensionClassInstancePtr,
        p_args: *const GDExtensionConstVariantPtr,
        p_argument_count: GDExtensionInt,
        r_return: GDExtensionVariantPtr,
        r_error: *mut GDExtensionCallError,
    ),
>;
pub type GDExtensionClassMethodPtrCall = Option<
    unsafe extern "C" fn(
        method_userdata: *mut c_void,
        p_instance: GDExtensionClassInstancePtr,
        p_args: *const GDExtensionConstTypePtr,
        r_ret: GDExtensionTypePtr,
    ),
>;

pub type GDExtensionInstanceBindingCreateCallback =
    Option<unsafe extern "C" fn(p_token: *mut c_void, p_instance: *mut c_void) -> *mut c_void>;
pub type GDExtensionInstanceBindingFreeCallback =
    Option<unsafe extern "C" fn(p_token: *mut c_void, p_instance: *mut c_void, p_binding: *mut c_void)>;
pub type GDExtensionInstanceBindingReferenceCallback = Option<
    unsafe extern "C" fn(p_token: *mut c_void, p_binding: *mut c_void, p_reference: GDExtensionBool) -> GDExtensionBool,
>;

pub type GDExtensionInitializeCallback =
    Option<unsafe extern "C" fn(userdata: *mut c_void, p_level: GDExtensionInitializationLevel)>;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Structs

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionInstanceBindingCallbacks {
    pub create_callback: GDExtensionInstanceBindingCreateCallback,
    pub free_callback: GDExtensionInstanceBindingFreeCallback,
    pub reference_callback: GDExtensionInstanceBindingReferenceCallback,
}

/// Class registration record handed to `classdb_register_extension_class`.
///
/// Absent callbacks (`None`) leave the engine's behavior for the base class in place.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionClassCreationInfo {
    pub is_virtual: GDExtensionBool,
    pub is_abstract: GDExtensionBool,
    pub set_func: GDExtensionClassSet,
    pub get_func: GDExtensionClassGet,
    pub get_property_list_func: GDExtensionClassGetPropertyList,
    pub free_property_list_func: GDExtensionClassFreePropertyList,
    pub property_can_revert_func: GDExtensionClassPropertyCanRevert,
    pub property_get_revert_func: GDExtensionClassPropertyGetRevert,
    pub notification_func: GDExtensionClassNotification,
    pub to_string_func: GDExtensionClassToString,
    pub reference_func: GDExtensionClassReference,
    pub unreference_func: GDExtensionClassUnreference,
    pub create_instance_func: GDExtensionClassCreateInstance,
    pub free_instance_func: GDExtensionClassFreeInstance,
    pub get_virtual_func: GDExtensionClassGetVirtual,
    pub get_rid_func: GDExtensionClassGetRID,
    pub class_userdata: *mut c_void,
}

/// Property description, as exchanged in property lists and method signatures.
///
/// The pointers are owned by whoever produced the record; see the respective callback for when they are released.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionPropertyInfo {
    pub type_: GDExtensionVariantType,
    pub name: GDExtensionStringNamePtr,
    pub class_name: GDExtensionStringNamePtr,
    pub hint: u32,
    pub hint_string: GDExtensionStringPtr,
    pub usage: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct GDExtensionCallError {
    pub error: GDExtensionCallErrorType,
    pub argument: i32,
    pub expected: i32,
}

/// Method registered with `classdb_register_extension_class_method`.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionClassMethodInfo {
    pub name: GDExtensionStringNamePtr,
    pub method_userdata: *mut c_void,
    pub call_func: GDExtensionClassMethodCall,
    pub ptrcall_func: GDExtensionClassMethodPtrCall,
    pub method_flags: u32,
    pub has_return_value: GDExtensionBool,
    pub return_value_info: *mut GDExtensionPropertyInfo,
    pub return_value_metadata: GDExtensionClassMethodArgumentMetadata,
    pub argument_count: u32,
    pub arguments_info: *mut GDExtensionPropertyInfo,
    pub arguments_metadata: *mut GDExtensionClassMethodArgumentMetadata,
    pub default_argument_count: u32,
    pub default_arguments: *mut GDExtensionVariantPtr,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionInitialization {
    pub minimum_initialization_level: GDExtensionInitializationLevel,
    pub userdata: *mut c_void,
    pub initialize: GDExtensionInitializeCallback,
    pub deinitialize: GDExtensionInitializeCallback,
}

/// Signature of the library entry point, `gdext_rust_init` by default.
pub type GDExtensionInitializationFunction = Option<
    unsafe extern "C" fn(
        p_get_proc_address: GDExtensionInterfaceGetProcAddress,
        p_library: GDExtensionClassLibraryPtr,
        r_initialization: *mut GDExtensionInitialization,
    ) -> GDExtensionBool,
>;

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionGodotVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub string: *const c_char,
}
