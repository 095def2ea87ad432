/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use proc_macro2::TokenStream;
use quote::quote;

use crate::util::{bail, ident, last_ident, path_is_single, KvParser};
use crate::ParseResult;

pub fn attribute_gdextension(item: venial::Item) -> ParseResult<TokenStream> {
    let mut impl_decl = match item {
        venial::Item::Impl(decl) => decl,
        other => return bail!(other, "#[gdextension] can only be applied to trait impls"),
    };

    let is_library_impl = impl_decl
        .trait_ty
        .as_ref()
        .and_then(last_ident)
        .is_some_and(|name| name == "ExtensionLibrary");

    if !is_library_impl {
        return bail!(&impl_decl, "#[gdextension] can only be applied to `impl ExtensionLibrary for T`");
    }

    if impl_decl.tk_unsafe.is_none() {
        return bail!(
            &impl_decl.tk_impl,
            "`impl ExtensionLibrary` must be marked unsafe, to confirm the library's safety contract"
        );
    }

    let (own_attributes, other_attributes) = std::mem::take(&mut impl_decl.attributes)
        .into_iter()
        .partition::<Vec<_>, _>(|attr| path_is_single(&attr.path, "gdextension"));
    impl_decl.attributes = other_attributes;

    let mut parser = KvParser::parse_required(&own_attributes, "gdextension", &impl_decl)?;
    let entry_symbol = parser.handle_ident("entry_symbol")?;
    parser.finish()?;

    let entry_symbol = entry_symbol.unwrap_or_else(|| ident("gdext_rust_init"));
    let impl_ty = &impl_decl.self_ty;

    Ok(quote! {
        #impl_decl

        #[no_mangle]
        unsafe extern "C" fn #entry_symbol(
            get_proc_address: ::gdbind::sys::GDExtensionInterfaceGetProcAddress,
            library: ::gdbind::sys::GDExtensionClassLibraryPtr,
            init: *mut ::gdbind::sys::GDExtensionInitialization,
        ) -> ::gdbind::sys::GDExtensionBool {
            ::gdbind::init::__gdext_load_library::<#impl_ty>(get_proc_address, library, init)
        }

        // Entry point must match the signature the engine expects.
        const _: ::gdbind::sys::GDExtensionInitializationFunction = Some(#entry_symbol);
    })
}
