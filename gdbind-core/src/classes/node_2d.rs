/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbind_ffi as sys;
use sys::BindError;

use crate::builtin::{GString, Vector2};
use crate::classes::{class_ptrcall, CanvasItem};
use crate::obj::{Constructible, GodotClass};

crate::engine_class! {
    /// 2D node with a transform.
    pub struct Node2D: CanvasItem, MemManual, Scene;
}

impl Constructible for Node2D {}

crate::inherits_transitive_CanvasItem!(Node2D);

sys::method_table! {
    pub(crate) struct Node2DMethods in NODE_2D_METHODS for "Node2D" {
        set_position = 743155724 => Owned,
        get_position = 3341600327 => Owned,
        set_rotation = 373806689 => Owned,
        get_rotation = 1740695150 => Owned,
    }
}

pub(crate) fn load_tables() -> Result<(), BindError> {
    NODE_2D_METHODS.initialize(Node2DMethods::try_load()?);
    Ok(())
}

impl Node2D {
    pub fn set_position(&mut self, position: Vector2) {
        class_ptrcall!(NODE_2D_METHODS.set_position(self.object_ptr), position => ())
    }

    pub fn get_position(&self) -> Vector2 {
        class_ptrcall!(NODE_2D_METHODS.get_position(self.object_ptr) => Vector2)
    }

    /// Sets the rotation in radians.
    pub fn set_rotation(&mut self, radians: f32) {
        class_ptrcall!(NODE_2D_METHODS.set_rotation(self.object_ptr), radians => ())
    }

    pub fn get_rotation(&self) -> f32 {
        class_ptrcall!(NODE_2D_METHODS.get_rotation(self.object_ptr) => f32)
    }
}

/// Virtual methods of `Node2D`, including those inherited from `CanvasItem` and `Node`.
#[allow(unused_variables)]
pub trait INode2D: GodotClass + crate::private::You_forgot_the_attribute__godot_api {
    object_callback_methods!();

    fn draw(&mut self) {
        unimplemented!()
    }

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
