/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Methods of user classes exposed to the engine with `#[func]`, and the entry points through which the engine calls
//! them (varcall with variants, ptrcall with native values).

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::ptr;

use gdbind_ffi as sys;
use sys::{interface_fn, GodotFfi, PtrcallType};

use crate::builtin::{FromGodot, StringName, ToGodot, Variant};
use crate::meta::{CallContext, PropertyInfo};
use crate::obj::{GdMut, GdRef, GodotClass};
use crate::private::handle_panic;
use crate::registry::trampoline::{Scope, ScopePhase, VirtualArgs, VirtualReturn};
use crate::storage::{as_storage, InstanceStorage};

/// How a `#[func]` receives its instance.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Receiver {
    /// `&self`
    Ref,
    /// `&mut self`
    Mut,
    /// No receiver; registered as static method.
    Static,
}

/// Method of a user class, registered with `classdb_register_extension_class_method`.
pub struct ClassMethodInfo {
    class_name: &'static str,
    method_name: &'static str,
    receiver: Receiver,
    return_value: Option<PropertyInfo>,
    arguments: Vec<PropertyInfo>,
    varcall: sys::GDExtensionClassMethodCall,
    ptrcall: sys::GDExtensionClassMethodPtrCall,
}

impl ClassMethodInfo {
    /// `return_value` is `None` for methods returning `()`.
    pub fn new<C: GodotClass>(
        method_name: &'static str,
        receiver: Receiver,
        return_value: Option<PropertyInfo>,
        arguments: Vec<PropertyInfo>,
        varcall: sys::GDExtensionClassMethodCall,
        ptrcall: sys::GDExtensionClassMethodPtrCall,
    ) -> Self {
        Self {
            class_name: C::CLASS_NAME,
            method_name,
            receiver,
            return_value,
            arguments,
            varcall,
            ptrcall,
        }
    }

    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    pub fn register_extension_class_method(&self) {
        let class_name = StringName::from(self.class_name);
        let method_name = StringName::from(self.method_name);

        // Records point into self; all of them are copied by the engine during the call.
        let mut return_value_sys = self.return_value.as_ref().map(PropertyInfo::property_sys);
        let mut arguments_sys: Vec<_> = self.arguments.iter().map(PropertyInfo::property_sys).collect();
        let mut arguments_metadata = vec![sys::GDEXTENSION_METHOD_ARGUMENT_METADATA_NONE; self.arguments.len()];

        let method_flags = match self.receiver {
            Receiver::Static => sys::GDEXTENSION_METHOD_FLAG_STATIC,
            Receiver::Ref | Receiver::Mut => sys::GDEXTENSION_METHOD_FLAGS_DEFAULT,
        };

        let info = sys::GDExtensionClassMethodInfo {
            name: method_name.sys() as sys::GDExtensionStringNamePtr,
            method_userdata: ptr::null_mut(),
            call_func: self.varcall,
            ptrcall_func: self.ptrcall,
            method_flags,
            has_return_value: sys::conv::bool_to_sys(return_value_sys.is_some()),
            return_value_info: return_value_sys
                .as_mut()
                .map_or(ptr::null_mut(), |info| info as *mut sys::GDExtensionPropertyInfo),
            return_value_metadata: sys::GDEXTENSION_METHOD_ARGUMENT_METADATA_NONE,
            argument_count: arguments_sys.len() as u32,
            arguments_info: arguments_sys.as_mut_ptr(),
            arguments_metadata: arguments_metadata.as_mut_ptr(),
            default_argument_count: 0,
            default_arguments: ptr::null_mut(),
        };

        sys::out!("   Register fn:   {}::{}", self.class_name, self.method_name);

        // SAFETY: info and everything it points to is live for the call.
        unsafe {
            interface_fn!(classdb_register_extension_class_method)(sys::get_library(), class_name.sys(), &info);
        }
    }
}

impl fmt::Debug for ClassMethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMethodInfo")
            .field("class_name", &self.class_name)
            .field("method_name", &self.method_name)
            .field("receiver", &self.receiver)
            .field("arguments", &self.arguments.len())
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Call entry points

/// Instance a `#[func]` is called on.
pub struct MethodInstance<'a> {
    storage: Option<&'a InstanceStorage>,
    context: CallContext<'static>,
}

impl<'a> MethodInstance<'a> {
    pub fn bind<C: 'static>(&self) -> GdRef<'a, C> {
        self.storage().get::<C>()
    }

    pub fn bind_mut<C: 'static>(&self) -> GdMut<'a, C> {
        self.storage().get_mut::<C>()
    }

    fn storage(&self) -> &'a InstanceStorage {
        match self.storage {
            Some(storage) => storage,
            None => panic!("{}: static method cannot bind an instance", self.context),
        }
    }
}

/// Variant arguments of a varcall, checked for arity before decoding.
pub struct VarcallArgs<'a> {
    args: &'a [sys::GDExtensionConstVariantPtr],
}

impl VarcallArgs<'_> {
    /// Converts argument `index`, or reports which argument has the wrong type.
    pub fn arg<T: FromGodot>(&self, index: usize) -> Result<T, sys::GDExtensionCallError> {
        // SAFETY: the engine passes live variants; the borrowed handle does not destroy it.
        let variant = unsafe { Variant::from_sys_borrowed(self.args[index]) };

        T::try_from_variant(&variant).map_err(|err| sys::GDExtensionCallError {
            error: sys::GDEXTENSION_CALL_ERROR_INVALID_ARGUMENT,
            argument: index as i32,
            expected: err.expected_type().sys(),
        })
    }
}

fn call_error(error: sys::GDExtensionCallErrorType, argument: i32, expected: i32) -> sys::GDExtensionCallError {
    sys::GDExtensionCallError {
        error,
        argument,
        expected,
    }
}

fn check_arity(arg_count: usize, arity: usize) -> Result<(), sys::GDExtensionCallError> {
    let expected = arity as i32;

    if arg_count < arity {
        Err(call_error(sys::GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS, 0, expected))
    } else if arg_count > arity {
        Err(call_error(sys::GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS, 0, expected))
    } else {
        Ok(())
    }
}

/// # Safety
/// Unless null, `instance` must be an extension instance of this library.
unsafe fn method_instance<'a>(
    instance: sys::GDExtensionClassInstancePtr,
    receiver: Receiver,
    context: CallContext<'static>,
) -> Result<MethodInstance<'a>, sys::GDExtensionCallError> {
    let storage = if instance.is_null() {
        None
    } else {
        Some(as_storage(instance))
    };

    if storage.is_none() && receiver != Receiver::Static {
        return Err(call_error(sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL, 0, 0));
    }

    Ok(MethodInstance { storage, context })
}

/// Runs one variant call of `C::method_name` from the engine.
///
/// `call` decodes the arguments through [`VarcallArgs`] and invokes the user method. Arity mismatches, failed argument
/// conversions and panics are reported through `err`; `ret` then keeps its previous value.
///
/// # Safety
/// Must only be called through the `call_func` of the method's registration: `args` points to `arg_count` live variants,
/// `ret` to an initialized variant and `err` to a writable error record.
#[allow(clippy::too_many_arguments)]
pub unsafe fn varcall<C, R, F>(
    instance: sys::GDExtensionClassInstancePtr,
    args: *const sys::GDExtensionConstVariantPtr,
    arg_count: sys::GDExtensionInt,
    ret: sys::GDExtensionVariantPtr,
    err: *mut sys::GDExtensionCallError,
    method_name: &'static str,
    arity: usize,
    receiver: Receiver,
    call: F,
) where
    C: GodotClass,
    R: ToGodot,
    F: FnOnce(&MethodInstance<'_>, &VarcallArgs<'_>) -> Result<R, sys::GDExtensionCallError>,
{
    let context = CallContext::func(C::CLASS_NAME, method_name);

    let outcome = handle_panic(
        || context,
        AssertUnwindSafe(|| -> Result<(), sys::GDExtensionCallError> {
            let instance = method_instance(instance, receiver, context)?;

            let arg_count = usize::try_from(arg_count).unwrap_or(0);
            check_arity(arg_count, arity)?;

            let args = if arg_count == 0 {
                &[][..]
            } else {
                std::slice::from_raw_parts(args, arg_count)
            };

            let result = call(&instance, &VarcallArgs { args })?;
            result.to_variant().move_return_ptr(ret, PtrcallType::Standard);
            Ok(())
        }),
    );

    *err = match outcome {
        Ok(Ok(())) => sys::GDExtensionCallError::default(),
        Ok(Err(error)) => {
            sys::out!("varcall {context} failed: {error:?}");
            error
        }
        // Already reported by handle_panic().
        Err(_) => call_error(sys::GDEXTENSION_CALL_ERROR_INVALID_METHOD, 0, 0),
    };
}

/// Runs one pointer call of `C::method_name` from the engine.
///
/// Arguments and return value use the same representation as in virtual calls. Panics are caught and reported; the
/// return slot then keeps its previous value.
///
/// # Safety
/// Must only be called through the `ptrcall_func` of the method's registration: `args` and `ret` match the method's
/// signature.
pub unsafe fn ptrcall<C, R, F>(
    instance: sys::GDExtensionClassInstancePtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
    method_name: &'static str,
    arity: usize,
    receiver: Receiver,
    call: F,
) where
    C: GodotClass,
    R: VirtualReturn,
    F: for<'s> FnOnce(&MethodInstance<'_>, &VirtualArgs<'s>) -> R,
{
    let context = CallContext::func(C::CLASS_NAME, method_name);

    let _ = handle_panic(
        || context,
        AssertUnwindSafe(|| {
            let Ok(instance) = method_instance(instance, receiver, context) else {
                panic!("{context}: called on null instance");
            };

            let scope = Scope::open(C::CLASS_NAME, method_name);
            let method_args = VirtualArgs::new(&scope, args, arity);

            let result = call(&instance, &method_args);
            scope.advance(ScopePhase::ImplInvoked);

            result.write_virtual_return(ret);
            scope.advance(ScopePhase::ResultEncoded);
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_errors_name_expected_count() {
        assert_eq!(check_arity(2, 2), Ok(()));

        let too_few = check_arity(1, 3).unwrap_err();
        assert_eq!(too_few.error, sys::GDEXTENSION_CALL_ERROR_TOO_FEW_ARGUMENTS);
        assert_eq!(too_few.expected, 3);

        let too_many = check_arity(4, 0).unwrap_err();
        assert_eq!(too_many.error, sys::GDEXTENSION_CALL_ERROR_TOO_MANY_ARGUMENTS);
        assert_eq!(too_many.expected, 0);
    }

    #[test]
    fn null_instance_is_only_accepted_for_static_methods() {
        let context = CallContext::func("Test", "method");

        let err = unsafe { method_instance(ptr::null_mut(), Receiver::Mut, context) }
            .err()
            .map(|err| err.error);
        assert_eq!(err, Some(sys::GDEXTENSION_CALL_ERROR_INSTANCE_IS_NULL));

        assert!(unsafe { method_instance(ptr::null_mut(), Receiver::Static, context) }.is_ok());
    }
}
