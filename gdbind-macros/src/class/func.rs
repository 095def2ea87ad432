/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::util::{bail, ident, path_is_single};
use crate::ParseResult;

/// Signature of a `#[func]` method.
struct FuncDefinition {
    method_name: Ident,
    receiver: Ident,
    param_names: Vec<Ident>,
    param_types: Vec<venial::TypeExpr>,
    return_ty: Option<venial::TypeExpr>,
}

/// Codegen for `#[godot_api] impl MyClass`.
///
/// Methods marked `#[func]` are registered with the engine; the others stay plain Rust methods.
pub fn transform_inherent_impl(class_name: Ident, mut impl_block: venial::Impl) -> ParseResult<TokenStream> {
    let prv = quote! { ::gdbind::private };

    let funcs = process_godot_fns(&mut impl_block)?;
    let method_registrations: Vec<TokenStream> = funcs
        .iter()
        .map(|func| make_method_registration(&class_name, func))
        .collect();

    Ok(quote! {
        #impl_block

        impl ::gdbind::obj::cap::ImplementsGodotApi for #class_name {
            fn __register_methods() {
                #( #method_registrations )*
            }
        }

        ::gdbind::sys::plugin_add!(__GDBIND_PLUGIN_REGISTRY in #prv; #prv::ClassPlugin::new::<#class_name>(
            #prv::PluginItem::InherentImpl(#prv::InherentImpl::of::<#class_name>())
        ));
    })
}

/// Collects the `#[func]` methods and removes the attribute, which is not known to the compiler.
fn process_godot_fns(impl_block: &mut venial::Impl) -> ParseResult<Vec<FuncDefinition>> {
    let mut funcs = Vec::new();

    for member in impl_block.body_items.iter_mut() {
        let venial::ImplMember::AssocFunction(function) = member else {
            continue;
        };

        let Some(index) = function
            .attributes
            .iter()
            .position(|attr| path_is_single(&attr.path, "func"))
        else {
            continue;
        };

        let attr = function.attributes.remove(index);
        if !matches!(attr.value, venial::AttributeValue::Empty) {
            return bail!(&function.name, "#[func] does not take any arguments");
        }

        funcs.push(parse_func(function)?);
    }

    Ok(funcs)
}

fn parse_func(function: &venial::Function) -> ParseResult<FuncDefinition> {
    if function.generic_params.is_some() {
        return bail!(&function.name, "#[func]: generic fn parameters are not supported");
    }

    if function.qualifiers.tk_async.is_some() || function.qualifiers.tk_unsafe.is_some() {
        return bail!(&function.name, "#[func]: fn qualifiers are not allowed");
    }

    let mut receiver = ident("Static");
    let mut param_names = Vec::new();
    let mut param_types = Vec::new();

    for (param, _punct) in &function.params.inner {
        match param {
            venial::FnParam::Receiver(param) => {
                if param.tk_ref.is_none() {
                    return bail!(&function.name, "#[func]: methods take `&self` or `&mut self`, not `self`");
                }

                receiver = if param.tk_mut.is_some() {
                    ident("Mut")
                } else {
                    ident("Ref")
                };
            }
            venial::FnParam::Typed(param) => {
                param_names.push(param.name.clone());
                param_types.push(param.ty.clone());
            }
        }
    }

    Ok(FuncDefinition {
        method_name: function.name.clone(),
        receiver,
        param_names,
        param_types,
        return_ty: function.return_ty.clone(),
    })
}

/// Block declaring the varcall and ptrcall entry points of one method, and registering them.
fn make_method_registration(class_name: &Ident, func: &FuncDefinition) -> TokenStream {
    let prv = quote! { ::gdbind::private };
    let sys = quote! { ::gdbind::sys };

    let method_name = &func.method_name;
    let method_str = method_name.to_string();
    let receiver = &func.receiver;
    let arity = func.param_types.len();

    let arg_idents: Vec<Ident> = (0..arity).map(|i| format_ident!("__arg{i}")).collect();
    let arg_indices: Vec<usize> = (0..arity).collect();
    let param_types = &func.param_types;
    let param_strs = func.param_names.iter().map(|name| name.to_string());

    let invocation = match receiver.to_string().as_str() {
        "Ref" => quote! { #class_name::#method_name(&*__instance.bind::<#class_name>(), #( #arg_idents ),*) },
        "Mut" => quote! { #class_name::#method_name(&mut *__instance.bind_mut::<#class_name>(), #( #arg_idents ),*) },
        _ => quote! {{
            let _ = __instance;
            #class_name::#method_name(#( #arg_idents ),*)
        }},
    };

    let return_info = match &func.return_ty {
        Some(return_ty) => quote! { Some(::gdbind::meta::PropertyInfo::of::<#return_ty>("")) },
        None => quote! { None },
    };

    quote! {
        {
            unsafe extern "C" fn __varcall(
                _method_userdata: *mut ::std::ffi::c_void,
                instance: #sys::GDExtensionClassInstancePtr,
                args: *const #sys::GDExtensionConstVariantPtr,
                arg_count: #sys::GDExtensionInt,
                ret: #sys::GDExtensionVariantPtr,
                err: *mut #sys::GDExtensionCallError,
            ) {
                #prv::varcall::<#class_name, _, _>(
                    instance,
                    args,
                    arg_count,
                    ret,
                    err,
                    #method_str,
                    #arity,
                    #prv::Receiver::#receiver,
                    |__instance, __args| {
                        #( let #arg_idents = __args.arg::<#param_types>(#arg_indices)?; )*
                        Ok(#invocation)
                    },
                )
            }

            unsafe extern "C" fn __ptrcall(
                _method_userdata: *mut ::std::ffi::c_void,
                instance: #sys::GDExtensionClassInstancePtr,
                args: *const #sys::GDExtensionConstTypePtr,
                ret: #sys::GDExtensionTypePtr,
            ) {
                #prv::ptrcall::<#class_name, _, _>(
                    instance,
                    args,
                    ret,
                    #method_str,
                    #arity,
                    #prv::Receiver::#receiver,
                    |__instance, __args| {
                        #( let #arg_idents = __args.arg::<#param_types>(#arg_indices); )*
                        __args.finish();
                        #invocation
                    },
                )
            }

            #prv::ClassMethodInfo::new::<#class_name>(
                #method_str,
                #prv::Receiver::#receiver,
                #return_info,
                vec![ #( ::gdbind::meta::PropertyInfo::of::<#param_types>(#param_strs) ),* ],
                Some(__varcall),
                Some(__ptrcall),
            )
            .register_extension_class_method();
        }
    }
}
