/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::util::{bail, ident, path_is_single, type_as_single_ident, KvParser};
use crate::ParseResult;

pub fn derive_godot_class(item: venial::Item) -> ParseResult<TokenStream> {
    let class = match item {
        venial::Item::Struct(class) => class,
        other => return bail!(other, "#[derive(GodotClass)] can only be applied to structs"),
    };

    if class.generic_params.is_some() {
        return bail!(&class.generic_params, "#[derive(GodotClass)] does not support generic parameters");
    }

    let struct_cfg = parse_struct_attributes(&class)?;
    let fields = parse_fields(&class)?;
    let base = classify_base(&class, &struct_cfg, &fields)?;

    let class_name = &class.name;
    let class_name_str = class_name.to_string();
    let base_ty = &base.ty;
    let native_base = &base.native;
    let is_abstract = struct_cfg.is_abstract;

    let prv = quote! { ::gdbind::private };

    let init_impl = make_init_impl(class_name, &struct_cfg, &fields);
    let view_impl = make_view_impl(class_name, &fields);
    let with_base_impl = make_with_base_field_impl(class_name, &fields);
    let inherits_impl = make_inherits_impl(class_name, &base);

    let constructible_impl = if is_abstract {
        TokenStream::new()
    } else {
        quote! {
            impl ::gdbind::obj::Constructible for #class_name {}
        }
    };

    Ok(quote! {
        impl ::gdbind::obj::GodotClass for #class_name {
            type Base = #base_ty;
            type Memory = <#base_ty as ::gdbind::obj::GodotClass>::Memory;

            const CLASS_NAME: &'static str = #class_name_str;
            const INIT_LEVEL: ::gdbind::sys::InitLevel = <#base_ty as ::gdbind::obj::GodotClass>::INIT_LEVEL;
        }

        impl ::gdbind::obj::UserClass for #class_name {
            type NativeBase = #native_base;

            #init_impl
        }

        #view_impl
        #with_base_impl
        #constructible_impl
        #inherits_impl

        ::gdbind::sys::plugin_add!(__GDBIND_PLUGIN_REGISTRY in #prv; #prv::ClassPlugin::new::<#class_name>(
            #prv::PluginItem::Struct(#prv::StructInfo::of::<#class_name>(#is_abstract))
        ));
    })
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Parsing

struct ClassAttributes {
    base_ident: Ident,
    has_generated_init: bool,
    is_abstract: bool,
}

struct Field {
    name: Ident,
    ty: venial::TypeExpr,
    default: Option<TokenStream>,
}

#[derive(Default)]
struct Fields {
    /// All fields except the `#[base]` and `#[parent]` fields.
    all_fields: Vec<Field>,

    /// The `#[base]` field, of type `Base<T>`.
    base_field: Option<Field>,

    /// The `#[parent]` field, embedding the user base class.
    parent_field: Option<Field>,
}

/// Base class as seen by the generated code.
struct BaseClass {
    ident: Ident,

    /// Type used for `GodotClass::Base`.
    ty: TokenStream,

    /// Type used for `UserClass::NativeBase`.
    native: TokenStream,

    is_user_class: bool,
}

fn parse_struct_attributes(class: &venial::Struct) -> ParseResult<ClassAttributes> {
    let mut base_ident = ident("RefCounted");
    let mut has_generated_init = false;
    let mut is_abstract = false;

    if let Some(mut parser) = KvParser::parse(&class.attributes, "class")? {
        if let Some(base) = parser.handle_ident("base")? {
            base_ident = base;
        }

        has_generated_init = parser.handle_alone("init")?;
        is_abstract = parser.handle_alone("abstract")?;
        parser.finish()?;
    }

    Ok(ClassAttributes {
        base_ident,
        has_generated_init,
        is_abstract,
    })
}

fn parse_fields(class: &venial::Struct) -> ParseResult<Fields> {
    let named_fields = match &class.fields {
        venial::Fields::Unit => vec![],
        venial::Fields::Tuple(_) => {
            return bail!(&class.fields, "#[derive(GodotClass)] is not supported for tuple structs");
        }
        venial::Fields::Named(fields) => fields.fields.inner.clone(),
    };

    let mut fields = Fields::default();

    for (named_field, _punct) in named_fields {
        let is_base = has_marker(&named_field.attributes, "base");
        let is_parent = has_marker(&named_field.attributes, "parent");

        let default = match KvParser::parse(&named_field.attributes, "init")? {
            Some(mut parser) => {
                let default = parser.handle_expr("val")?;
                parser.finish()?;
                default
            }
            None => None,
        };

        let field = Field {
            name: named_field.name.clone(),
            ty: named_field.ty.clone(),
            default,
        };

        match (is_base, is_parent) {
            (true, true) => {
                return bail!(&named_field.name, "a field cannot be both #[base] and #[parent]");
            }
            (true, false) => {
                if field.default.is_some() {
                    return bail!(&named_field.name, "#[base] field cannot have an #[init] value");
                }
                if fields.base_field.replace(field).is_some() {
                    return bail!(&named_field.name, "#[base] allowed for at most 1 field");
                }
            }
            (false, true) => {
                if field.default.is_some() {
                    return bail!(&named_field.name, "#[parent] field cannot have an #[init] value");
                }
                if fields.parent_field.replace(field).is_some() {
                    return bail!(&named_field.name, "#[parent] allowed for at most 1 field");
                }
            }
            (false, false) => fields.all_fields.push(field),
        }
    }

    Ok(fields)
}

fn has_marker(attributes: &[venial::Attribute], name: &str) -> bool {
    attributes.iter().any(|attr| path_is_single(&attr.path, name))
}

/// A `#[parent]` field makes the base a user class; otherwise it is an engine class.
fn classify_base(class: &venial::Struct, cfg: &ClassAttributes, fields: &Fields) -> ParseResult<BaseClass> {
    let base_ident = cfg.base_ident.clone();

    let Some(parent) = &fields.parent_field else {
        let ty = quote! { ::gdbind::classes::#base_ident };

        return Ok(BaseClass {
            ident: base_ident,
            native: ty.clone(),
            ty,
            is_user_class: false,
        });
    };

    if let Some(base_field) = &fields.base_field {
        return bail!(
            &base_field.name,
            "class with user-class base `{base_ident}` cannot have a #[base] field; the base object lives in the #[parent] field"
        );
    }

    if type_as_single_ident(&parent.ty).as_ref() != Some(&base_ident) {
        return bail!(
            &parent.ty,
            "#[parent] field of {} must have the base class type `{base_ident}`",
            class.name
        );
    }

    Ok(BaseClass {
        native: quote! { <#base_ident as ::gdbind::obj::UserClass>::NativeBase },
        ty: quote! { #base_ident },
        ident: base_ident,
        is_user_class: true,
    })
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Code generation

fn make_init_impl(class_name: &Ident, cfg: &ClassAttributes, fields: &Fields) -> TokenStream {
    let body = if cfg.has_generated_init {
        let base_init = fields.base_field.as_ref().map(|Field { name, .. }| {
            quote! { #name: base, }
        });

        let parent_init = fields.parent_field.as_ref().map(|Field { name, ty, .. }| {
            quote! { #name: <#ty as ::gdbind::obj::UserClass>::__init(base), }
        });

        let rest_init = fields.all_fields.iter().map(|field| {
            let name = &field.name;
            let value = field
                .default
                .clone()
                .unwrap_or_else(|| quote! { ::std::default::Default::default() });

            quote! { #name: #value, }
        });

        // Without base or parent field, the base handle is simply not stored.
        let discard = if fields.base_field.is_none() && fields.parent_field.is_none() {
            quote! { let _ = base; }
        } else {
            TokenStream::new()
        };

        quote! {
            #discard
            Self {
                #base_init
                #parent_init
                #( #rest_init )*
            }
        }
    } else if cfg.is_abstract {
        let message = format!("abstract class {class_name} cannot be instantiated");
        quote! {
            let _ = base;
            panic!(#message)
        }
    } else {
        quote! {
            <Self as ::gdbind::obj::UserInit>::init(base)
        }
    };

    quote! {
        fn __init(base: ::gdbind::obj::Base<Self::NativeBase>) -> Self {
            #body
        }
    }
}

fn make_view_impl(class_name: &Ident, fields: &Fields) -> TokenStream {
    let (delegate, delegate_mut) = match &fields.parent_field {
        Some(Field { name, ty, .. }) => (
            quote! { <#ty as ::gdbind::obj::InstanceView>::__view(&self.#name, type_id) },
            quote! { <#ty as ::gdbind::obj::InstanceView>::__view_mut(&mut self.#name, type_id) },
        ),
        None => (quote! { None }, quote! { None }),
    };

    quote! {
        impl ::gdbind::obj::InstanceView for #class_name {
            fn __view(&self, type_id: ::std::any::TypeId) -> Option<&dyn ::std::any::Any> {
                if type_id == ::std::any::TypeId::of::<Self>() {
                    Some(self)
                } else {
                    #delegate
                }
            }

            fn __view_mut(&mut self, type_id: ::std::any::TypeId) -> Option<&mut dyn ::std::any::Any> {
                if type_id == ::std::any::TypeId::of::<Self>() {
                    Some(self)
                } else {
                    #delegate_mut
                }
            }
        }
    }
}

fn make_with_base_field_impl(class_name: &Ident, fields: &Fields) -> TokenStream {
    let body = if let Some(Field { name, .. }) = &fields.base_field {
        quote! { &self.#name }
    } else if let Some(Field { name, ty, .. }) = &fields.parent_field {
        quote! { <#ty as ::gdbind::obj::WithBaseField>::base_field(&self.#name) }
    } else {
        return TokenStream::new();
    };

    quote! {
        impl ::gdbind::obj::WithBaseField for #class_name {
            fn base_field(&self) -> &::gdbind::obj::Base<Self::NativeBase> {
                #body
            }
        }
    }
}

/// Implements `Inherits` for all ancestors, and declares the macro that lets later classes inherit from this one.
fn make_inherits_impl(class_name: &Ident, base: &BaseClass) -> TokenStream {
    let own_macro = format_ident!("__inherits_transitive_{}", class_name);

    let base_macro_call = if base.is_user_class {
        let base_macro = format_ident!("__inherits_transitive_{}", base.ident);
        quote! { #base_macro! }
    } else {
        let base_macro = format_ident!("inherits_transitive_{}", base.ident);
        quote! { ::gdbind::private::class_macros::#base_macro! }
    };

    quote! {
        #[allow(unused_macros)]
        macro_rules! #own_macro {
            ($T:ty) => {
                unsafe impl ::gdbind::obj::Inherits<#class_name> for $T {}
                #base_macro_call($T);
            };
        }

        #base_macro_call(#class_name);
    }
}
