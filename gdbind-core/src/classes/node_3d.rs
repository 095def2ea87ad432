/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbind_ffi as sys;
use sys::BindError;

use crate::builtin::{GString, Vector3};
use crate::classes::{class_ptrcall, Node};
use crate::obj::{Constructible, GodotClass};

crate::engine_class! {
    /// 3D node with a transform.
    pub struct Node3D: Node, MemManual, Scene;
}

impl Constructible for Node3D {}

crate::inherits_transitive_Node!(Node3D);

sys::method_table! {
    pub(crate) struct Node3DMethods in NODE_3D_METHODS for "Node3D" {
        set_position = 3460891852 => Owned,
        get_position = 3360562783 => Owned,
    }
}

pub(crate) fn load_tables() -> Result<(), BindError> {
    NODE_3D_METHODS.initialize(Node3DMethods::try_load()?);
    Ok(())
}

impl Node3D {
    pub fn set_position(&mut self, position: Vector3) {
        class_ptrcall!(NODE_3D_METHODS.set_position(self.object_ptr), position => ())
    }

    pub fn get_position(&self) -> Vector3 {
        class_ptrcall!(NODE_3D_METHODS.get_position(self.object_ptr) => Vector3)
    }
}

/// Virtual methods of `Node3D`, including those inherited from `Node`.
#[allow(unused_variables)]
pub trait INode3D: GodotClass + crate::private::You_forgot_the_attribute__godot_api {
    object_callback_methods!();

    fn ready(&mut self) {
        unimplemented!()
    }

    fn process(&mut self, delta: f64) {
        unimplemented!()
    }

    fn physics_process(&mut self, delta: f64) {
        unimplemented!()
    }

    fn enter_tree(&mut self) {
        unimplemented!()
    }

    fn exit_tree(&mut self) {
        unimplemented!()
    }

    fn to_string(&self) -> GString {
        unimplemented!()
    }
}
