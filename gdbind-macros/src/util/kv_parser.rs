/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;

use proc_macro2::{Ident, Span, TokenStream, TokenTree};
use quote::ToTokens;

use super::{bail, error, ident, is_punct, path_is_single};
use crate::ParseResult;

type KvMap = HashMap<Ident, Option<KvValue>>;

/// Parses attributes of the form `#[attr(flag, key = value, other = some::expr())]`.
///
/// Each key is consumed by one `handle_*` call; [`finish()`](Self::finish) then reports keys nobody asked for.
pub(crate) struct KvParser {
    map: KvMap,
    span: Span,
}

impl KvParser {
    /// Like [`parse()`](Self::parse), but the attribute must be present. `context` provides the error span.
    pub fn parse_required(
        attributes: &[venial::Attribute],
        expected: &str,
        context: impl ToTokens,
    ) -> ParseResult<Self> {
        match Self::parse(attributes, expected)? {
            Some(parser) => Ok(parser),
            None => bail!(context, "expected attribute #[{expected}], but not present"),
        }
    }

    /// Looks for `#[expected(...)]` among `attributes`; `Ok(None)` if absent.
    pub fn parse(attributes: &[venial::Attribute], expected: &str) -> ParseResult<Option<Self>> {
        let mut found: Option<Self> = None;

        for attr in attributes {
            if !path_is_single(&attr.path, expected) {
                continue;
            }

            if found.is_some() {
                return bail!(attr, "only a single #[{expected}] attribute allowed");
            }

            found = Some(Self {
                span: attr.tk_brackets.span,
                map: ParserState::parse(expected, &attr.value)?,
            });
        }

        Ok(found)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Handles a flag without value, e.g. `init` in `#[class(init)]`. Returns whether it is present.
    pub fn handle_alone(&mut self, key: &str) -> ParseResult<bool> {
        match self.map.remove(&ident(key)) {
            None => Ok(false),
            Some(None) => Ok(true),
            Some(Some(value)) => bail!(&value.tokens[0], "key `{key}` should not have a value"),
        }
    }

    /// Handles `key = Identifier`.
    pub fn handle_ident(&mut self, key: &str) -> ParseResult<Option<Ident>> {
        match self.map.remove_entry(&ident(key)) {
            None => Ok(None),
            // The removed key carries the span of the user's attribute.
            Some((key, None)) => bail!(key, "expected `{key}` to be followed by `= identifier`"),
            Some((_key, Some(value))) => value.ident().map(Some),
        }
    }

    /// Handles `key = <any tokens up to the next comma>`.
    pub fn handle_expr(&mut self, key: &str) -> ParseResult<Option<TokenStream>> {
        match self.map.remove_entry(&ident(key)) {
            None => Ok(None),
            Some((key, None)) => bail!(key, "expected `{key}` to be followed by `= expression`"),
            Some((_key, Some(value))) => Ok(Some(value.expr())),
        }
    }

    /// Fails on every key that was not handled.
    pub fn finish(self) -> ParseResult<()> {
        let mut errors = self
            .map
            .into_keys()
            .map(|key| error!(&key, "unrecognized key `{key}`"));

        match errors.next() {
            None => Ok(()),
            Some(first) => Err(errors.fold(first, |mut acc, e| {
                acc.combine(e);
                acc
            })),
        }
    }
}

#[derive(Clone, Debug)]
struct KvValue {
    /// Never empty.
    tokens: Vec<TokenTree>,
}

impl KvValue {
    fn new(tokens: Vec<TokenTree>) -> Self {
        assert!(!tokens.is_empty());
        Self { tokens }
    }

    fn expr(self) -> TokenStream {
        self.tokens.into_iter().collect()
    }

    fn ident(self) -> ParseResult<Ident> {
        match self.tokens.as_slice() {
            [TokenTree::Ident(ident)] => Ok(ident.clone()),
            [TokenTree::Ident(_), surplus, ..] => {
                bail!(surplus, "expected a single identifier, not an expression")
            }
            [other, ..] => bail!(other, "expected identifier"),
            [] => unreachable!("KvValue is never empty"),
        }
    }
}

/// Cursor over the tokens inside `#[attr(...)]`.
struct ParserState<'a> {
    attr_name: &'a str,
    tokens: std::slice::Iter<'a, TokenTree>,
    prev: Option<&'a TokenTree>,
    cur: Option<&'a TokenTree>,
}

impl<'a> ParserState<'a> {
    fn parse(attr_name: &'a str, attr_value: &'a venial::AttributeValue) -> ParseResult<KvMap> {
        let mut tokens = match attr_value {
            venial::AttributeValue::Equals(punct, _tokens) => {
                return bail!(punct, "expected `(` or `]`");
            }
            _ => attr_value.get_value_tokens().iter(),
        };
        let cur = tokens.next();

        let parser = Self {
            attr_name,
            tokens,
            prev: None,
            cur,
        };

        parser.parse_map()
    }

    fn parse_map(mut self) -> ParseResult<KvMap> {
        let mut map = KvMap::new();

        while let Some(cur) = self.cur {
            let TokenTree::Ident(key) = cur else {
                return bail!(cur, "expected identifier as key in #[{}]", self.attr_name);
            };

            self.next();
            let value = self.parse_opt_value(key)?;
            if map.contains_key(key) {
                return bail!(key, "duplicate key `{key}`");
            }
            map.insert(key.clone(), value);
        }

        Ok(map)
    }

    fn parse_opt_value(&mut self, key: &Ident) -> ParseResult<Option<KvValue>> {
        match self.cur {
            None => Ok(None),
            Some(tt) if is_punct(tt, ',') => {
                self.next();
                Ok(None)
            }
            Some(tt) if is_punct(tt, '=') => {
                self.next();
                self.parse_value().map(Some)
            }
            Some(tt) => bail!(tt, "expected `,` or `= value` following `{key}`"),
        }
    }

    fn parse_value(&mut self) -> ParseResult<KvValue> {
        let mut tokens = Vec::new();
        while let Some(cur) = self.cur {
            self.next();
            if is_punct(cur, ',') {
                break;
            }
            tokens.push(cur.clone());
        }

        if tokens.is_empty() {
            // Points at `=` or at the `,` directly following it.
            let Some(prev) = self.prev else {
                return bail!(Span::call_site(), "expected value after `=`");
            };
            return bail!(prev, "expected value after `=`");
        }

        Ok(KvValue::new(tokens))
    }

    fn next(&mut self) {
        self.prev = self.cur;
        self.cur = self.tokens.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    fn parser_for(attribute: TokenStream) -> ParseResult<Option<KvParser>> {
        let item = venial::parse_item(quote! {
            #attribute
            struct Dummy;
        })
        .expect("parse struct");

        KvParser::parse(struct_attributes(&item), "class")
    }

    fn struct_attributes(item: &venial::Item) -> &[venial::Attribute] {
        match item {
            venial::Item::Struct(decl) => &decl.attributes,
            other => panic!("expected struct, got {other:?}"),
        }
    }

    fn class_parser(attribute: TokenStream) -> KvParser {
        parser_for(attribute).expect("valid attribute").expect("attribute present")
    }

    fn tokens_eq(actual: Option<TokenStream>, expected: TokenStream) -> bool {
        actual.map(|t| t.to_string()) == Some(expected.to_string())
    }

    #[test]
    fn flags_and_values() {
        let mut parser = class_parser(quote! { #[class(init, base = Node2D, abstract)] });

        assert!(parser.handle_alone("init").unwrap());
        assert!(parser.handle_alone("abstract").unwrap());
        assert!(!parser.handle_alone("tool").unwrap());
        assert_eq!(parser.handle_ident("base").unwrap().unwrap(), "Node2D");
        parser.finish().unwrap();
    }

    #[test]
    fn expressions_up_to_comma() {
        let mut parser = class_parser(quote! { #[class(val = Vector2::new(1.0, -2.0), neg = -42, last = "text",)] });

        assert!(tokens_eq(parser.handle_expr("val").unwrap(), quote! { Vector2::new(1.0, -2.0) }));
        assert!(tokens_eq(parser.handle_expr("neg").unwrap(), quote! { -42 }));
        assert!(tokens_eq(parser.handle_expr("last").unwrap(), quote! { "text" }));
        parser.finish().unwrap();
    }

    #[test]
    fn absent_attribute() {
        let item = venial::parse_item(quote! { struct Dummy; }).unwrap();
        let attributes = struct_attributes(&item);

        assert!(KvParser::parse(attributes, "class").unwrap().is_none());
        assert!(KvParser::parse_required(attributes, "class", quote! { Dummy }).is_err());
    }

    #[test]
    fn unhandled_key_is_error() {
        let mut parser = class_parser(quote! { #[class(init, bogus)] });

        assert!(parser.handle_alone("init").unwrap());
        assert!(parser.finish().is_err());
    }

    #[test]
    fn malformed_attributes() {
        assert!(parser_for(quote! { #[class(base = )] }).is_err());
        assert!(parser_for(quote! { #[class(init init)] }).is_err());
        assert!(parser_for(quote! { #[class(init, init)] }).is_err());
        assert!(parser_for(quote! { #[class("literal")] }).is_err());
    }

    #[test]
    fn flag_with_value_is_error() {
        let mut parser = class_parser(quote! { #[class(init = true)] });
        assert!(parser.handle_alone("init").is_err());

        let mut parser = class_parser(quote! { #[class(base)] });
        assert!(parser.handle_ident("base").is_err());
    }
}
