/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Library and engine working together: user classes, engine façades and handles across the boundary.

use gdbind::handle::Ownership;
use gdbind::prelude::*;
use gdbind::registry::ClassDb;
use gdbind_itest::echo::Echo;
use gdbind_itest::{assert_no_violations, boot, mock, serial};

#[derive(GodotClass)]
#[class(base = Node2D, init)]
struct Stat {
    #[base]
    base: Base<Node2D>,
    #[init(val = 7)]
    value: i64,
}

impl Stat {
    fn set_value(&mut self, value: i64) {
        self.value = value;
    }
}

/// Greets by name; constructed by hand instead of `#[class(init)]`.
#[derive(GodotClass)]
struct Greeter {
    #[base]
    base: Base<RefCounted>,
    greeting: String,
}

impl UserInit for Greeter {
    fn init(base: Base<RefCounted>) -> Self {
        Self {
            base,
            greeting: "hello".to_string(),
        }
    }
}

#[derive(GodotClass)]
#[class(base = EditorImportPlugin, init)]
struct CsvImporter {
    #[base]
    base: Base<EditorImportPlugin>,
}

const ERR_FILE_UNRECOGNIZED: i64 = 15;
const ERR_INVALID_PARAMETER: i64 = 31;

#[godot_api]
impl IEditorImportPlugin for CsvImporter {
    fn get_importer_name(&self) -> GString {
        GString::from("csv_rows")
    }

    fn get_priority(&self) -> f64 {
        2.0
    }

    fn import(
        &self,
        source_file: &GString,
        _save_path: &GString,
        options: &Dictionary,
        _platform_variants: &Array,
        _gen_files: &Array,
    ) -> i64 {
        if !source_file.to_rust_string().ends_with(".csv") {
            return ERR_FILE_UNRECOGNIZED;
        }

        match options.get("rows").and_then(|rows| rows.try_to::<i64>().ok()) {
            Some(rows) if rows > 0 => 0,
            _ => ERR_INVALID_PARAMETER,
        }
    }
}

#[test]
fn state_is_per_instance() {
    boot();
    let _guard = serial();

    let mut changed = Stat::new_alloc();
    let untouched = Stat::new_alloc();

    changed.bind_mut().set_value(42);
    assert_eq!(changed.bind().value, 42);
    assert_eq!(untouched.bind().value, 7);

    // Same for engine-side state.
    let mut echo = Echo::new_gd();
    let other = Echo::new_gd();
    echo.set_value(42);
    assert_eq!(echo.get_value(), 42);
    assert_eq!(other.get_value(), 0);

    let mut position_source = changed.bind().base();
    position_source.set_position(Vector2::new(42.0, 0.0));
    assert_eq!(changed.bind().base().get_position(), Vector2::new(42.0, 0.0));
    assert_eq!(untouched.bind().base().get_position(), Vector2::ZERO);
    drop(position_source);

    changed.free();
    untouched.free();
    assert_no_violations();
}

#[test]
fn hand_written_init_runs() {
    boot();
    let _guard = serial();

    let greeter = Greeter::new_gd();
    assert_eq!(greeter.bind().greeting, "hello");
    assert_eq!(greeter.bind().base().get_reference_count(), 2);
    assert_eq!(greeter.upcast_ref::<RefCounted>().get_class(), "Greeter");
}

#[test]
fn materialize_falls_back_to_nearest_registered_class() {
    boot();
    let _guard = serial();

    let sprite = mock::instantiate("Sprite2D").expect("Sprite2D not instantiable");

    // SAFETY: live object; the engine keeps ownership.
    let any = unsafe { ClassDb::get().materialize(sprite.sys(), Ownership::Borrowed) };
    let node = any.downcast::<Gd<Node2D>>().expect("Sprite2D not materialized as Node2D");

    assert_eq!(node.ownership(), Ownership::Borrowed);
    assert_eq!(node.get_class(), "Sprite2D");
    assert_eq!(node.dynamic_class_name(), "Sprite2D");
    drop(node);

    let stat = mock::instantiate("Stat").expect("Stat not instantiable");

    // SAFETY: as above.
    let any = unsafe { ClassDb::get().materialize(stat.sys(), Ownership::Borrowed) };
    let stat_gd = any.downcast::<Gd<Stat>>().expect("user class not materialized as itself");
    assert_eq!(stat_gd.bind().value, 7);
    drop(stat_gd);

    mock::release(sprite);
    mock::release(stat);
    assert_no_violations();
}

#[test]
fn casts_follow_the_runtime_class() {
    boot();
    let _guard = serial();

    let node = Node2D::new_alloc().upcast::<Node>();
    assert_eq!(node.ownership(), Ownership::Owned);

    let node = match node.try_cast::<Node3D>() {
        Ok(_) => panic!("Node2D cast to Node3D"),
        Err(original) => original,
    };
    assert_eq!(node.ownership(), Ownership::Owned);

    let node_2d = node.try_cast::<Node2D>().expect("Node2D cast failed");
    assert_eq!(node_2d.ownership(), Ownership::Owned);
    assert_eq!(format!("{node_2d}"), format!("Node2D#{}", node_2d.instance_id()));

    let id = node_2d.instance_id();
    let found = Gd::<Node>::try_from_instance_id(id).expect("lookup by ID failed");
    assert_eq!(found.ownership(), Ownership::Borrowed);
    assert!(Gd::<Node3D>::try_from_instance_id(id).is_none());
    drop(found);

    node_2d.free();
    assert!(Gd::<Node>::try_from_instance_id(id).is_none());
    assert_no_violations();
}

#[test]
fn import_plugin_is_called_by_the_engine() {
    boot();
    let _guard = serial();

    let counts_before = mock::native_counts();
    let importer = mock::instantiate("CsvImporter").expect("CsvImporter not instantiable");

    assert_eq!(mock::call_get_importer_name(importer).as_deref(), Some("csv_rows"));
    assert_eq!(mock::call_get_priority(importer), Some(2.0));
    assert_eq!(mock::call_import(importer, "res://data.csv", "res://out", &[("rows", 3)]), Some(0));
    assert_eq!(
        mock::call_import(importer, "res://data.csv", "res://out", &[("rows", 0)]),
        Some(ERR_INVALID_PARAMETER)
    );
    assert_eq!(
        mock::call_import(importer, "res://data.txt", "res://out", &[]),
        Some(ERR_FILE_UNRECOGNIZED)
    );

    // Not overridden: the engine keeps its default.
    assert_eq!(mock::call_to_string(importer), None);

    mock::release(importer);
    assert!(!mock::is_live(importer));
    assert_eq!(mock::native_counts(), counts_before);
    assert_no_violations();
}

#[test]
fn scene_tree_handles() {
    boot();
    let _guard = serial();

    let mut parent = Node2D::new_alloc();
    parent.set_name("parent");
    let mut child = Node::new_alloc();
    child.set_name("child");
    child.add_to_group("enemies");
    parent.add_child(&child);

    assert_eq!(parent.get_child_count(), 1);
    let engine_parent = mock::handle_of(parent.instance_id()).expect("parent unknown to engine");
    assert_eq!(mock::children_of(engine_parent).len(), 1);

    let bound = parent.get_child(0).expect("child missing");
    assert_eq!(bound.ownership(), Ownership::BoundTo(parent.instance_id()));
    assert_eq!(bound.get_name(), "child");
    assert!(bound.is_in_group("enemies"));
    assert!(!bound.is_in_group("friends"));
    assert_eq!(bound.get_groups().len(), 1);
    assert!(parent.get_child(1).is_none());
    drop(bound);

    let copy = child.duplicate().expect("duplicate failed");
    assert_eq!(copy.ownership(), Ownership::Owned);
    assert_ne!(copy.instance_id(), child.instance_id());
    assert!(copy.get_parent().is_none());
    copy.free();

    // Freeing the parent frees the child, too.
    parent.free();
    assert!(!child.is_instance_valid());
    drop(child);
    assert_no_violations();
}

#[test]
fn engine_properties_round_trip() {
    boot();
    let _guard = serial();

    let mut node = Node2D::new_alloc();
    let other = Node2D::new_alloc();
    let default_priority = other.get_process_priority();

    node.set_process_priority(42);
    node.set_rotation(1.5);
    node.set_visible(false);
    node.set_modulate(Color::from_rgba(1.0, 0.5, 0.25, 1.0));

    assert_eq!(node.get_process_priority(), 42);
    assert_eq!(other.get_process_priority(), default_priority);
    assert_eq!(node.get_rotation(), 1.5);
    assert!(!node.is_visible());
    assert!(other.is_visible());
    assert_eq!(node.get_modulate(), Color::from_rgba(1.0, 0.5, 0.25, 1.0));

    node.set_meta("score", 42_i64);
    assert!(node.has_meta("score"));
    assert!(!other.has_meta("score"));
    assert_eq!(node.get_meta("score").to::<i64>(), 42);
    assert!(other.get_meta("score").is_nil());

    let mut spatial = Node3D::new_alloc();
    spatial.set_position(Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(spatial.get_position(), Vector3::new(1.0, 2.0, 3.0));

    node.free();
    other.free();
    spatial.free();
    assert_no_violations();
}
