/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbind_ffi as sys;
use sys::BindError;

use crate::builtin::{Color, GString};
use crate::classes::{class_ptrcall, Node};
use crate::obj::GodotClass;

crate::engine_class! {
    /// Abstract base of everything drawn in 2D.
    pub struct CanvasItem: Node, MemManual, Scene;
}

crate::inherits_transitive_Node!(CanvasItem);

sys::method_table! {
    pub(crate) struct CanvasItemMethods in CANVAS_ITEM_METHODS for "CanvasItem" {
        set_modulate = 2920490490 => Owned,
        get_modulate = 3444240500 => Owned,
        set_visible = 2586408642 => Owned,
        is_visible = 36873697 => Owned,
    }
}

pub(crate) fn load_tables() -> Result<(), BindError> {
    CANVAS_ITEM_METHODS.initialize(CanvasItemMethods::try_load()?);
    Ok(())
}

impl CanvasItem {
    pub fn set_modulate(&mut self, modulate: Color) {
        class_ptrcall!(CANVAS_ITEM_METHODS.set_modulate(self.object_ptr), modulate => ())
    }

    pub fn get_modulate(&self) -> Color {
        class_ptrcall!(CANVAS_ITEM_METHODS.get_modulate(self.object_ptr) => Color)
    }

    pub fn set_visible(&mut self, visible: bool) {
        class_ptrcall!(CANVAS_ITEM_METHODS.set_visible(self.object_ptr), visible => ())
    }

    pub fn is_visible(&self) -> bool {
        class_ptrcall!(CANVAS_ITEM_METHODS.is_visible(self.object_ptr) => bool)
    }
}

/// Virtual methods of `CanvasItem`, including those inherited from `Node`.
#[allow(unused_variables)]
pub trait ICanvasItem: GodotClass + crate::private::You_forgot_the_attribute__godot_api {
    object_callback_methods!();

    /// Called when the item must redraw itself.
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
