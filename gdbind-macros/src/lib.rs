/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Proc-macros of gdbind.
//!
//! Do not depend on this crate directly, instead use the `gdbind` crate.

mod class;
mod gdextension;
mod util;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;

use crate::util::ident;

/// Derive macro for [`GodotClass`](../gdbind/obj/trait.GodotClass.html) on structs.
///
/// # Base class
///
/// `#[class(base = Node2D)]` selects an engine class as base; the struct then needs a field of type `Base<Node2D>`,
/// marked with `#[base]`. Without `base`, the class derives from `RefCounted`.
///
/// A user class can also be the base. Its instance is embedded as a field marked `#[parent]`, which carries the
/// `Base<T>` of the engine class at the root:
///
/// ```ignore
/// #[derive(GodotClass)]
/// #[class(base = Node, init)]
/// struct Enemy {
///     #[base]
///     base: Base<Node>,
///     health: i64,
/// }
///
/// #[derive(GodotClass)]
/// #[class(base = Enemy, init)]
/// struct Boss {
///     #[parent]
///     enemy: Enemy,
///     #[init(val = 3)]
///     phases: i64,
/// }
/// ```
///
/// The base user class must be declared before the derived one, in the same module.
///
/// # Construction
///
/// `#[class(init)]` generates the constructor: the `#[base]` field receives the base object, `#[parent]` is
/// constructed recursively, and all other fields are `Default::default()` unless given `#[init(val = expr)]`.
/// Without `init`, the class implements `UserInit` by hand.
///
/// `#[class(abstract)]` registers the class, but the engine refuses to instantiate it.
#[proc_macro_derive(GodotClass, attributes(class, base, parent, init))]
pub fn derive_godot_class(input: TokenStream) -> TokenStream {
    translate(input, class::derive_godot_class)
}

/// Proc-macro attribute for `impl` blocks of user classes.
///
/// # Interface-trait impls
///
/// On `impl INode for MyClass`, every method becomes a virtual-method override, registered under its engine name
/// (`ready` is called for `_ready`). Methods of the trait that are not overridden fall back to the nearest base class
/// that overrides them.
///
/// The object callbacks `on_notification`, `get_property`, `set_property`, `get_property_list` and
/// `property_get_revert` are no virtual methods; overriding them registers the corresponding class callback.
///
/// # Inherent impls
///
/// On `impl MyClass`, methods marked `#[func]` are registered with the engine and can be called from there, with
/// variant arguments or native ones. Receivers can be `&self`, `&mut self` or none (static method).
///
/// ```ignore
/// #[godot_api]
/// impl Counter {
///     #[func]
///     fn add(&mut self, amount: i64) -> i64 {
///         self.total += amount;
///         self.total
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn godot_api(meta: TokenStream, input: TokenStream) -> TokenStream {
    translate(input, |item| class::attribute_godot_api(TokenStream2::from(meta), item))
}

/// Proc-macro attribute to be used in combination with the `ExtensionLibrary` trait.
///
/// Emits the C entry point `gdext_rust_init`, or the name given with `#[gdextension(entry_symbol = my_init)]`.
#[proc_macro_attribute]
pub fn gdextension(meta: TokenStream, input: TokenStream) -> TokenStream {
    translate_meta("gdextension", meta, input, gdextension::attribute_gdextension)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementation

type ParseResult<T> = Result<T, venial::Error>;

/// For `#[derive(...)]` derive macros.
fn translate<F>(input: TokenStream, transform: F) -> TokenStream
where
    F: FnOnce(venial::Item) -> ParseResult<TokenStream2>,
{
    let input2 = TokenStream2::from(input);

    let result2 = venial::parse_item(input2)
        .and_then(transform)
        .unwrap_or_else(|e| e.to_compile_error());

    TokenStream::from(result2)
}

/// For `#[proc_macro_attribute]` procedural macros whose arguments are parsed like an attribute of the item.
fn translate_meta<F>(self_name: &str, meta: TokenStream, input: TokenStream, transform: F) -> TokenStream
where
    F: FnOnce(venial::Item) -> ParseResult<TokenStream2>,
{
    let self_name = ident(self_name);
    let input2 = TokenStream2::from(input);
    let meta2 = TokenStream2::from(meta);

    let result2 = util::venial_parse_meta(&meta2, self_name, &input2)
        .and_then(transform)
        .unwrap_or_else(|e| e.to_compile_error());

    TokenStream::from(result2)
}
