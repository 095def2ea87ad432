/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod kv_parser;

use proc_macro2::{Ident, TokenStream, TokenTree};
use quote::spanned::Spanned;
use quote::{format_ident, quote};

use crate::ParseResult;

pub(crate) use kv_parser::KvParser;

pub fn ident(s: &str) -> Ident {
    format_ident!("{}", s)
}

pub fn bail_fn<R, T>(msg: impl AsRef<str>, tokens: T) -> ParseResult<R>
where
    T: Spanned,
{
    Err(error_fn(msg, tokens))
}

pub fn error_fn<T>(msg: impl AsRef<str>, tokens: T) -> venial::Error
where
    T: Spanned,
{
    venial::Error::new_at_span(tokens.__span(), msg.as_ref())
}

/// Returns `Err` with a formatted message, pointing at the span of the first argument.
macro_rules! bail {
    ($tokens:expr, $format_string:literal $($rest:tt)*) => {
        $crate::util::bail_fn(format!($format_string $($rest)*), $tokens)
    }
}

macro_rules! error {
    ($tokens:expr, $format_string:literal $($rest:tt)*) => {
        $crate::util::error_fn(format!($format_string $($rest)*), $tokens)
    }
}

pub(crate) use bail;
pub(crate) use error;

pub(crate) fn is_punct(tt: &TokenTree, c: char) -> bool {
    match tt {
        TokenTree::Punct(punct) => punct.as_char() == c,
        _ => false,
    }
}

pub(crate) fn path_is_single(path: &[TokenTree], expected: &str) -> bool {
    path.len() == 1 && path[0].to_string() == expected
}

/// Last identifier of a type path, e.g. `INode` for `gdbind::classes::INode`.
pub(crate) fn last_ident(ty: &venial::TypeExpr) -> Option<Ident> {
    ty.tokens.iter().rev().find_map(|tt| match tt {
        TokenTree::Ident(ident) => Some(ident.clone()),
        _ => None,
    })
}

/// Whether a type is a single identifier, without path or generic arguments.
pub(crate) fn type_as_single_ident(ty: &venial::TypeExpr) -> Option<Ident> {
    match ty.tokens.as_slice() {
        [TokenTree::Ident(ident)] => Some(ident.clone()),
        _ => None,
    }
}

/// Parses the arguments of an attribute macro by pretending they are an attribute on `content`.
pub fn venial_parse_meta(
    meta: &TokenStream,
    self_name: Ident,
    content: &TokenStream,
) -> Result<venial::Item, venial::Error> {
    // venial has no direct meta parsing.
    let input = quote! {
        #[#self_name(#meta)]
        #content
    };

    venial::parse_item(input)
}
