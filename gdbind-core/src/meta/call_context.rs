/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use gdbind_ffi as sys;

/// Information about a call across the C boundary, for error messages.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CallContext<'a> {
    pub(crate) class_name: &'a str,
    pub(crate) function_name: &'a str,
}

impl<'a> CallContext<'a> {
    /// Call from the engine into a user-defined virtual function.
    pub const fn func(class_name: &'a str, function_name: &'a str) -> Self {
        Self {
            class_name,
            function_name,
        }
    }

    /// Outbound call from Rust into an engine method.
    pub fn outbound(method: &sys::ClassMethod) -> CallContext<'static> {
        CallContext {
            class_name: method.class_name,
            function_name: method.method_name,
        }
    }

    pub fn class_name(&self) -> &'a str {
        self.class_name
    }

    pub fn function_name(&self) -> &'a str {
        self.function_name
    }
}

impl fmt::Display for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class_name, self.function_name)
    }
}
