/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::class::func::transform_inherent_impl;
use crate::util::{bail, last_ident, type_as_single_ident};
use crate::ParseResult;

/// Object callbacks of interface traits. Overriding one registers its callback, instead of a virtual method.
const OBJECT_CALLBACKS: [&str; 5] = [
    "on_notification",
    "get_property",
    "set_property",
    "get_property_list",
    "property_get_revert",
];

pub fn attribute_godot_api(meta: TokenStream, item: venial::Item) -> ParseResult<TokenStream> {
    let decl = match item {
        venial::Item::Impl(decl) => decl,
        other => return bail!(other, "#[godot_api] can only be applied on impl blocks"),
    };

    if !meta.is_empty() {
        return bail!(meta, "#[godot_api] does not take any arguments");
    }

    if decl.impl_generic_params.is_some() {
        return bail!(&decl, "#[godot_api] does not support lifetimes or generic parameters");
    }

    let Some(class_name) = type_as_single_ident(&decl.self_ty) else {
        return bail!(&decl.self_ty, "#[godot_api] requires the Self type to be a simple identifier");
    };

    match &decl.trait_ty {
        Some(trait_ty) => {
            let trait_is_interface = last_ident(trait_ty).is_some_and(|name| name.to_string().starts_with('I'));
            if !trait_is_interface {
                return bail!(trait_ty, "#[godot_api] requires an engine interface trait such as `INode`");
            }

            let trait_ty = trait_ty.clone();
            transform_interface_impl(class_name, trait_ty, decl)
        }
        None => transform_inherent_impl(class_name, decl),
    }
}

/// Codegen for `#[godot_api] impl INode for MyClass`.
fn transform_interface_impl(
    class_name: Ident,
    trait_ty: venial::TypeExpr,
    decl: venial::Impl,
) -> ParseResult<TokenStream> {
    let prv = quote! { ::gdbind::private };

    let mut virtual_arms = Vec::new();
    let mut cap_impls = Vec::new();
    let mut builder_calls = Vec::new();

    for member in &decl.body_items {
        let venial::ImplMember::AssocFunction(function) = member else {
            return bail!(member, "#[godot_api] interface-trait impls may only contain methods");
        };

        let signature = parse_signature(function)?;
        let method_str = signature.method_name.to_string();

        if OBJECT_CALLBACKS.contains(&method_str.as_str()) {
            let (cap_impl, builder_call) = make_object_callback(&class_name, &trait_ty, &method_str);
            cap_impls.push(cap_impl);
            builder_calls.push(builder_call);
        } else {
            virtual_arms.push(make_virtual_arm(&class_name, &trait_ty, &signature));
        }
    }

    Ok(quote! {
        #decl

        impl #prv::You_forgot_the_attribute__godot_api for #class_name {}

        impl ::gdbind::obj::ImplementsVirtuals for #class_name {
            fn __virtual_call(name: &str) -> ::gdbind::sys::GDExtensionClassCallVirtual {
                match name {
                    #( #virtual_arms )*
                    _ => None,
                }
            }
        }

        #( #cap_impls )*

        ::gdbind::sys::plugin_add!(__GDBIND_PLUGIN_REGISTRY in #prv; #prv::ClassPlugin::new::<#class_name>(
            #prv::PluginItem::ITraitImpl(
                #prv::ITraitImpl::new(<#class_name as ::gdbind::obj::ImplementsVirtuals>::__virtual_call)
                    #( #builder_calls )*
            )
        ));
    })
}

/// Capability impl forwarding to the interface-trait method, plus the builder call registering its callback.
fn make_object_callback(class_name: &Ident, trait_ty: &venial::TypeExpr, method_str: &str) -> (TokenStream, TokenStream) {
    let cap = quote! { ::gdbind::obj::cap };
    let string_name = quote! { ::gdbind::builtin::StringName };
    let variant = quote! { ::gdbind::builtin::Variant };

    match method_str {
        "on_notification" => (
            quote! {
                impl #cap::GodotNotification for #class_name {
                    fn __godot_notification(&mut self, what: i32) {
                        <Self as #trait_ty>::on_notification(self, what)
                    }
                }
            },
            quote! { .with_on_notification::<#class_name>() },
        ),
        "get_property" => (
            quote! {
                impl #cap::GodotGet for #class_name {
                    fn __godot_get_property(&self, property: #string_name) -> Option<#variant> {
                        <Self as #trait_ty>::get_property(self, property)
                    }
                }
            },
            quote! { .with_get_property::<#class_name>() },
        ),
        "set_property" => (
            quote! {
                impl #cap::GodotSet for #class_name {
                    fn __godot_set_property(&mut self, property: #string_name, value: #variant) -> bool {
                        <Self as #trait_ty>::set_property(self, property, value)
                    }
                }
            },
            quote! { .with_set_property::<#class_name>() },
        ),
        "get_property_list" => (
            quote! {
                impl #cap::GodotGetPropertyList for #class_name {
                    fn __godot_get_property_list(&mut self) -> Vec<::gdbind::meta::PropertyInfo> {
                        <Self as #trait_ty>::get_property_list(self)
                    }
                }
            },
            quote! { .with_get_property_list::<#class_name>() },
        ),
        "property_get_revert" => (
            quote! {
                impl #cap::GodotPropertyGetRevert for #class_name {
                    fn __godot_property_get_revert(&self, property: #string_name) -> Option<#variant> {
                        <Self as #trait_ty>::property_get_revert(self, property)
                    }
                }
            },
            quote! { .with_property_get_revert::<#class_name>() },
        ),
        other => unreachable!("not an object callback: {other}"),
    }
}

struct VirtualSignature {
    method_name: Ident,
    param_types: Vec<venial::TypeExpr>,
}

fn parse_signature(function: &venial::Function) -> ParseResult<VirtualSignature> {
    if function.generic_params.is_some() {
        return bail!(&function.name, "virtual methods cannot have generic parameters");
    }

    let mut has_receiver = false;
    let mut param_types = Vec::new();

    for (param, _punct) in &function.params.inner {
        match param {
            venial::FnParam::Receiver(receiver) => {
                if receiver.tk_ref.is_none() {
                    return bail!(&function.name, "virtual methods take `&self` or `&mut self`, not `self`");
                }
                has_receiver = true;
            }
            venial::FnParam::Typed(param) => param_types.push(param.ty.clone()),
        }
    }

    if !has_receiver {
        return bail!(&function.name, "virtual methods must have a `&self` or `&mut self` receiver");
    }

    Ok(VirtualSignature {
        method_name: function.name.clone(),
        param_types,
    })
}

/// Match arm `"_name" => Some(trampoline)`, with the trampoline declared inside the arm.
fn make_virtual_arm(class_name: &Ident, trait_ty: &venial::TypeExpr, signature: &VirtualSignature) -> TokenStream {
    let method_name = &signature.method_name;
    let method_str = method_name.to_string();
    let virtual_name = format!("_{method_str}");
    let arity = signature.param_types.len();

    let arg_idents: Vec<Ident> = (0..arity).map(|i| format_ident!("__arg{i}")).collect();
    let arg_indices = 0..arity;
    let param_types = &signature.param_types;

    quote! {
        #virtual_name => {
            unsafe extern "C" fn __trampoline(
                instance: ::gdbind::sys::GDExtensionClassInstancePtr,
                args: *const ::gdbind::sys::GDExtensionConstTypePtr,
                ret: ::gdbind::sys::GDExtensionTypePtr,
            ) {
                ::gdbind::private::virtual_trampoline::<#class_name, _, _>(
                    instance,
                    args,
                    ret,
                    #method_str,
                    #arity,
                    |this, args| {
                        #( let #arg_idents = args.arg::<#param_types>(#arg_indices); )*
                        args.finish();
                        <#class_name as #trait_ty>::#method_name(this, #( #arg_idents ),*)
                    },
                )
            }

            Some(__trampoline)
        }
    }
}
