/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;

/// Failure to resolve something the binding needs from the engine.
///
/// Resolution happens once at startup. The infallible loaders turn these into panics; fallible `try_*` variants hand
/// them to the caller.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum BindError {
    /// `get_proc_address` returned null for an interface function.
    MissingInterfaceFn { name: &'static str },

    /// A builtin constructor, destructor, method or variant converter was not provided.
    MissingLifecycleFn { description: &'static str },

    /// `classdb_get_method_bind` returned null.
    UnresolvedMethod {
        class_name: &'static str,
        method_name: &'static str,
        hash: i64,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInterfaceFn { name } => {
                write!(f, "interface function `{name}` not provided by the engine")
            }
            Self::MissingLifecycleFn { description } => {
                write!(f, "builtin lifecycle function {description} not provided by the engine")
            }
            Self::UnresolvedMethod {
                class_name,
                method_name,
                hash,
            } => {
                write!(f, "failed to resolve method bind {class_name}::{method_name} (hash {hash})")
            }
        }
    }
}

impl Error for BindError {}

#[cfg(test)]
mod tests {
    use super::BindError;

    #[test]
    fn unresolved_method_message() {
        let err = BindError::UnresolvedMethod {
            class_name: "Node",
            method_name: "get_child",
            hash: 541253412,
        };

        assert_eq!(
            err.to_string(),
            "failed to resolve method bind Node::get_child (hash 541253412)"
        );
    }

    #[test]
    fn missing_interface_message() {
        let err = BindError::MissingInterfaceFn { name: "object_destroy" };
        assert!(err.to_string().contains("`object_destroy`"));
    }
}
