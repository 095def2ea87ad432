/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Interface function table, loaded by name through `get_proc_address`.

use std::ffi::{c_char, c_void};

use crate as sys;
use crate::BindError;

macro_rules! interface_table {
    (
        $(
            $( #[$attr:meta] )*
            fn $name:ident( $( $param:ident: $Param:ty ),* $(,)? ) $( -> $Ret:ty )?;
        )*
    ) => {
        /// Function pointers of the engine's C interface.
        ///
        /// Every entry is resolved once in [`load()`](Self::load); a table never contains null entries.
        #[allow(clippy::type_complexity)]
        pub struct GDExtensionInterface {
            $(
                $( #[$attr] )*
                pub $name: unsafe extern "C" fn( $( $Param ),* ) $( -> $Ret )?,
            )*
        }

        impl GDExtensionInterface {
            /// Names of all functions that [`load()`](Self::load) resolves.
            pub const FUNCTION_NAMES: &'static [&'static str] = &[ $( stringify!($name), )* ];

            /// Resolves every function through `get_proc_address`.
            ///
            /// # Safety
            /// `get_proc_address` must return function pointers whose signature matches the declared one.
            pub unsafe fn load(get_proc_address: sys::GDExtensionInterfaceGetProcAddress) -> Result<Self, BindError> {
                let get_proc_address = get_proc_address
                    .ok_or(BindError::MissingInterfaceFn { name: "get_proc_address" })?;

                Ok(Self {
                    $(
                        $name: {
                            let raw = get_proc_address(sys::c_str(concat!(stringify!($name), "\0").as_bytes()))
                                .ok_or(BindError::MissingInterfaceFn { name: stringify!($name) })?;

                            sys::out!("  loaded interface fn {}", stringify!($name));
                            std::mem::transmute::<
                                unsafe extern "C" fn(),
                                unsafe extern "C" fn( $( $Param ),* ) $( -> $Ret )?
                            >(raw)
                        },
                    )*
                })
            }
        }
    };
}

interface_table! {
    fn get_godot_version(r_godot_version: *mut sys::GDExtensionGodotVersion);
    fn print_error(
        p_description: *const c_char,
        p_function: *const c_char,
        p_file: *const c_char,
        p_line: i32,
        p_editor_notify: sys::GDExtensionBool,
    );
    fn print_warning(
        p_description: *const c_char,
        p_function: *const c_char,
        p_file: *const c_char,
        p_line: i32,
        p_editor_notify: sys::GDExtensionBool,
    );

    // Variant
    fn variant_new_copy(r_dest: sys::GDExtensionUninitializedVariantPtr, p_src: sys::GDExtensionConstVariantPtr);
    fn variant_new_nil(r_dest: sys::GDExtensionUninitializedVariantPtr);
    fn variant_destroy(p_self: sys::GDExtensionVariantPtr);
    fn variant_get_type(p_self: sys::GDExtensionConstVariantPtr) -> sys::GDExtensionVariantType;
    fn get_variant_from_type_constructor(
        p_type: sys::GDExtensionVariantType,
    ) -> sys::GDExtensionVariantFromTypeConstructorFunc;
    fn get_variant_to_type_constructor(
        p_type: sys::GDExtensionVariantType,
    ) -> sys::GDExtensionTypeFromVariantConstructorFunc;
    fn variant_get_ptr_constructor(
        p_type: sys::GDExtensionVariantType,
        p_constructor: i32,
    ) -> sys::GDExtensionPtrConstructor;
    fn variant_get_ptr_destructor(p_type: sys::GDExtensionVariantType) -> sys::GDExtensionPtrDestructor;
    fn variant_get_ptr_builtin_method(
        p_type: sys::GDExtensionVariantType,
        p_method: sys::GDExtensionConstStringNamePtr,
        p_hash: sys::GDExtensionInt,
    ) -> sys::GDExtensionPtrBuiltInMethod;

    // Strings and containers
    fn string_new_with_utf8_chars_and_len(
        r_dest: sys::GDExtensionUninitializedStringPtr,
        p_contents: *const c_char,
        p_size: sys::GDExtensionInt,
    );
    fn string_to_utf8_chars(
        p_self: sys::GDExtensionConstStringPtr,
        r_text: *mut c_char,
        p_max_write_length: sys::GDExtensionInt,
    ) -> sys::GDExtensionInt;
    fn string_name_new_with_utf8_chars_and_len(
        r_dest: sys::GDExtensionUninitializedStringNamePtr,
        p_contents: *const c_char,
        p_size: sys::GDExtensionInt,
    );
    fn array_operator_index(p_self: sys::GDExtensionTypePtr, p_index: sys::GDExtensionInt) -> sys::GDExtensionVariantPtr;
    fn dictionary_operator_index(
        p_self: sys::GDExtensionTypePtr,
        p_key: sys::GDExtensionConstVariantPtr,
    ) -> sys::GDExtensionVariantPtr;
    fn dictionary_operator_index_const(
        p_self: sys::GDExtensionConstTypePtr,
        p_key: sys::GDExtensionConstVariantPtr,
    ) -> sys::GDExtensionVariantPtr;

    // Objects
    fn object_method_bind_ptrcall(
        p_method_bind: sys::GDExtensionMethodBindPtr,
        p_instance: sys::GDExtensionObjectPtr,
        p_args: *const sys::GDExtensionConstTypePtr,
        r_ret: sys::GDExtensionTypePtr,
    );
    fn object_destroy(p_o: sys::GDExtensionObjectPtr);
    fn object_get_instance_id(p_object: sys::GDExtensionConstObjectPtr) -> sys::GDObjectInstanceID;
    fn object_get_instance_from_id(p_instance_id: sys::GDObjectInstanceID) -> sys::GDExtensionObjectPtr;
    fn object_cast_to(p_object: sys::GDExtensionConstObjectPtr, p_class_tag: *mut c_void) -> sys::GDExtensionObjectPtr;
    fn object_get_class_name(
        p_object: sys::GDExtensionConstObjectPtr,
        p_library: sys::GDExtensionClassLibraryPtr,
        r_class_name: sys::GDExtensionUninitializedStringNamePtr,
    ) -> sys::GDExtensionBool;
    fn object_set_instance(
        p_o: sys::GDExtensionObjectPtr,
        p_classname: sys::GDExtensionConstStringNamePtr,
        p_instance: sys::GDExtensionClassInstancePtr,
    );
    fn object_get_instance_binding(
        p_o: sys::GDExtensionObjectPtr,
        p_token: *mut c_void,
        p_callbacks: *const sys::GDExtensionInstanceBindingCallbacks,
    ) -> *mut c_void;
    fn object_set_instance_binding(
        p_o: sys::GDExtensionObjectPtr,
        p_token: *mut c_void,
        p_binding: *mut c_void,
        p_callbacks: *const sys::GDExtensionInstanceBindingCallbacks,
    );
    fn ref_get_object(p_ref: sys::GDExtensionConstRefPtr) -> sys::GDExtensionObjectPtr;
    fn ref_set_object(p_ref: sys::GDExtensionRefPtr, p_object: sys::GDExtensionObjectPtr);

    // ClassDB
    fn classdb_construct_object(p_classname: sys::GDExtensionConstStringNamePtr) -> sys::GDExtensionObjectPtr;
    fn classdb_get_method_bind(
        p_classname: sys::GDExtensionConstStringNamePtr,
        p_methodname: sys::GDExtensionConstStringNamePtr,
        p_hash: sys::GDExtensionInt,
    ) -> sys::GDExtensionMethodBindPtr;
    fn classdb_get_class_tag(p_classname: sys::GDExtensionConstStringNamePtr) -> *mut c_void;
    fn classdb_register_extension_class(
        p_library: sys::GDExtensionClassLibraryPtr,
        p_class_name: sys::GDExtensionConstStringNamePtr,
        p_parent_class_name: sys::GDExtensionConstStringNamePtr,
        p_extension_funcs: *const sys::GDExtensionClassCreationInfo,
    );
    fn classdb_register_extension_class_method(
        p_library: sys::GDExtensionClassLibraryPtr,
        p_class_name: sys::GDExtensionConstStringNamePtr,
        p_method_info: *const sys::GDExtensionClassMethodInfo,
    );
    fn classdb_unregister_extension_class(
        p_library: sys::GDExtensionClassLibraryPtr,
        p_class_name: sys::GDExtensionConstStringNamePtr,
    );
}

impl std::fmt::Debug for GDExtensionInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GDExtensionInterface")
            .field("functions", &Self::FUNCTION_NAMES.len())
            .finish_non_exhaustive()
    }
}

/// Instance-binding callbacks passed along with the binding token. The binding never asks the engine to create
/// bindings lazily, so all of them are absent.
pub static EMPTY_BINDING_CALLBACKS: sys::GDExtensionInstanceBindingCallbacks =
    sys::GDExtensionInstanceBindingCallbacks {
        create_callback: None,
        free_callback: None,
        reference_callback: None,
    };

/// Opaque token identifying this library in instance-binding calls.
pub fn binding_token() -> *mut c_void {
    sys::get_library()
}

#[cfg(test)]
mod tests {
    use super::GDExtensionInterface;

    #[test]
    fn function_names_are_unique() {
        let mut names = GDExtensionInterface::FUNCTION_NAMES.to_vec();
        let count = names.len();

        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), count);
        assert!(names.contains(&"object_method_bind_ptrcall"));
        assert!(names.contains(&"classdb_unregister_extension_class"));
    }

    #[test]
    fn load_without_get_proc_address_fails() {
        let err = unsafe { GDExtensionInterface::load(None) }.unwrap_err();
        assert_eq!(
            err,
            crate::BindError::MissingInterfaceFn {
                name: "get_proc_address"
            }
        );
    }
}
