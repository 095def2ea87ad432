/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Conversions from some rust-types into appropriate engine types.

use crate as sys;

/// Converts a rust-bool into a sys-bool.
pub const fn bool_to_sys(value: bool) -> sys::GDExtensionBool {
    value as sys::GDExtensionBool
}

/// Converts a sys-bool into a rust-bool; any non-zero value is true.
pub const fn bool_from_sys(value: sys::GDExtensionBool) -> bool {
    value != 0
}

pub const SYS_TRUE: sys::GDExtensionBool = bool_to_sys(true);
pub const SYS_FALSE: sys::GDExtensionBool = bool_to_sys(false);

#[cfg(test)]
mod test {
    use crate::conv::{bool_from_sys, bool_to_sys, SYS_FALSE, SYS_TRUE};

    #[test]
    fn sys_bool() {
        assert_eq!(bool_to_sys(true), SYS_TRUE);
        assert_eq!(bool_to_sys(false), SYS_FALSE);
        assert!(bool_from_sys(2));
        assert!(!bool_from_sys(SYS_FALSE));
    }
}
