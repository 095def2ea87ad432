/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbind_ffi as sys;
use sys::BindError;

use crate::builtin::{Array, GString, StringName};
use crate::classes::{class_ptrcall, Object};
use crate::obj::{Constructible, Gd, GodotClass, Inherits};

crate::engine_class! {
    /// Element of the scene tree. Manually managed.
    ///
    /// A node owns its children: freeing a node frees the whole subtree, so handles to children obtained from
    /// [`get_child()`](Self::get_child) are bound to the parent.
    pub struct Node: Object, MemManual, Scene;
}

impl Constructible for Node {}

crate::inherits_transitive_Object!(Node);

sys::method_table! {
    pub(crate) struct NodeMethods in NODE_METHODS for "Node" {
        set_name = 3304788590 => Owned,
        get_name = 2002593661 => Owned,
        set_process_priority = 1286410249 => Owned,
        get_process_priority = 3905245786 => Owned,
        add_child = 3863233950 => Owned,
        get_child_count = 894402480 => Owned,
        get_child = 541253412 => BoundToReceiver,
        get_parent = 3160264692 => Borrowed,
        remove_child = 1078189570 => Owned,
        duplicate = 3511555459 => Owned,
        add_to_group = 3683006648 => Owned,
        is_in_group = 2619796661 => Owned,
        get_groups = 3995934104 => Owned,
    }
}

pub(crate) fn load_tables() -> Result<(), BindError> {
    NODE_METHODS.initialize(NodeMethods::try_load()?);
    Ok(())
}

/// Flags for [`Node::duplicate()`]: signals, groups, scripts, instancing.
const DUPLICATE_ALL: i64 = 15;

/// `Node.INTERNAL_MODE_DISABLED`
const INTERNAL_MODE_DISABLED: i64 = 0;

impl Node {
    pub fn set_name(&mut self, name: &str) {
        let name = StringName::from(name);
        class_ptrcall!(NODE_METHODS.set_name(self.object_ptr), &name => ())
    }

    pub fn get_name(&self) -> StringName {
        class_ptrcall!(NODE_METHODS.get_name(self.object_ptr) => StringName)
    }

    pub fn set_process_priority(&mut self, priority: i32) {
        class_ptrcall!(NODE_METHODS.set_process_priority(self.object_ptr), priority => ())
    }

    pub fn get_process_priority(&self) -> i32 {
        class_ptrcall!(NODE_METHODS.get_process_priority(self.object_ptr) => i32)
    }

    /// Adds `node` as last child. The parent takes over ownership of the child's lifetime.
    pub fn add_child<C: Inherits<Node>>(&mut self, node: &Gd<C>) {
        class_ptrcall!(
            NODE_METHODS.add_child(self.object_ptr), node, false, INTERNAL_MODE_DISABLED => ()
        )
    }

    pub fn get_child_count(&self) -> i32 {
        class_ptrcall!(NODE_METHODS.get_child_count(self.object_ptr), false => i32)
    }

    /// Child at `index`, or `None` if out of range. The handle is bound to `self`.
    pub fn get_child(&self, index: i32) -> Option<Gd<Node>> {
        class_ptrcall!(NODE_METHODS.get_child(self.object_ptr), index, false => Option<Gd<Node>>)
    }

    /// Parent node, if any. The handle is borrowed.
    pub fn get_parent(&self) -> Option<Gd<Node>> {
        class_ptrcall!(NODE_METHODS.get_parent(self.object_ptr) => Option<Gd<Node>>)
    }

    /// Detaches `node`; the caller becomes responsible for freeing it again.
    pub fn remove_child<C: Inherits<Node>>(&mut self, node: &Gd<C>) {
        class_ptrcall!(NODE_METHODS.remove_child(self.object_ptr), node => ())
    }

    /// Copy of this node and its subtree, owned by the caller.
    pub fn duplicate(&self) -> Option<Gd<Node>> {
        class_ptrcall!(NODE_METHODS.duplicate(self.object_ptr), DUPLICATE_ALL => Option<Gd<Node>>)
    }

    pub fn add_to_group(&mut self, group: &str) {
        let group = StringName::from(group);
        class_ptrcall!(NODE_METHODS.add_to_group(self.object_ptr), &group, false => ())
    }

    pub fn is_in_group(&self, group: &str) -> bool {
        let group = StringName::from(group);
        class_ptrcall!(NODE_METHODS.is_in_group(self.object_ptr), &group => bool)
    }

    /// Names of all groups this node is in, as `StringName` elements.
    pub fn get_groups(&self) -> Array {
        class_ptrcall!(NODE_METHODS.get_groups(self.object_ptr) => Array)
    }
}

/// Virtual methods of `Node`.
#[allow(unused_variables)]
pub trait INode: GodotClass + crate::private::You_forgot_the_attribute__godot_api {
    object_callback_methods!();

    /// Called when the node and its children entered the scene tree.
    fn ready(&mut self) {
        unimplemented!()
    }

    /// Called every frame, `delta` being the elapsed time in seconds.
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
