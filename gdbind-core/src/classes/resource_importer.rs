/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::GString;
use crate::classes::RefCounted;
use crate::obj::GodotClass;

crate::engine_class! {
    /// Abstract base of resource importers.
    pub struct ResourceImporter: RefCounted, MemRefCounted, Core;
}

crate::inherits_transitive_RefCounted!(ResourceImporter);

/// Virtual methods of `ResourceImporter`.
#[allow(unused_variables)]
pub trait IResourceImporter: GodotClass + crate::private::You_forgot_the_attribute__godot_api {
    object_callback_methods!();

    fn to_string(&self) -> GString {
        unimplemented!()
    }
}
