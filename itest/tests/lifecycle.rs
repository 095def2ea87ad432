/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Full load and unload cycle: hooks per level, registration order, unregistration in reverse.

use gdbind::init::InitLevel;
use gdbind::prelude::*;
use gdbind_itest::{assert_no_violations, boot, level_events, mock, LevelEvent};

#[derive(GodotClass)]
#[class(base = Node, init)]
struct Root {
    #[base]
    base: Base<Node>,
}

#[derive(GodotClass)]
#[class(base = Root, init)]
struct Leaf {
    #[parent]
    root: Root,
}

#[derive(GodotClass)]
#[class(base = EditorImportPlugin, init)]
struct Tool {
    #[base]
    base: Base<EditorImportPlugin>,
}

#[test]
fn load_and_unload() {
    boot();

    use InitLevel::*;
    assert_eq!(
        level_events(),
        [
            LevelEvent::Init(Core),
            LevelEvent::Init(Servers),
            LevelEvent::Init(Scene),
            LevelEvent::Init(Editor),
        ]
    );

    let registered = mock::registered_classes();
    assert!(registered.contains(&("Root".to_string(), "Node".to_string())));
    assert!(registered.contains(&("Leaf".to_string(), "Root".to_string())));
    assert!(registered.contains(&("Tool".to_string(), "EditorImportPlugin".to_string())));

    // Objects of user classes live and die before the library unloads.
    let leaf = Leaf::new_alloc();
    assert_eq!(leaf.upcast_ref::<Node>().get_class(), "Leaf");
    leaf.free();

    // Dropped without free(): still counted at unload.
    drop(Node::new_alloc());

    mock::deinitialize_levels();

    assert_eq!(mock::unregistered_classes(), ["Tool", "Leaf", "Root"]);
    assert!(mock::registered_classes().is_empty());

    let events = level_events();
    assert_eq!(
        events[4..],
        [
            LevelEvent::Deinit(Editor),
            LevelEvent::Deinit(Scene),
            LevelEvent::Deinit(Servers),
            LevelEvent::Deinit(Core),
        ]
    );

    let warnings = mock::warnings().join("\n");
    assert!(warnings.contains("handles still alive at shutdown"), "warnings: {warnings}");
    assert_no_violations();
}
